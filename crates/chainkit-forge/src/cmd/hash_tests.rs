use crate::cmd::hash::*;

#[test]
fn test_sha3_line() {
    // Act
    let line = sha3_line("test");

    // Assert
    assert_eq!(
        line,
        "keccak256(test) = 0x9c22ff5f21f0b81b113e63f7db6da94fedef11b2119b4088b89664fb9a3cb658"
    );
}

#[test]
fn test_sha3_line_of_empty_string() {
    let line = sha3_line("");

    assert_eq!(
        line,
        "keccak256() = 0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}
