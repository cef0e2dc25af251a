//! Call encoders for the well-known OpenZeppelin interfaces the tasks drive.

use ethers::contract::abigen;

abigen!(
    AccessControl,
    r#"[
        function grantRole(bytes32 role, address account) external
        function revokeRole(bytes32 role, address account) external
        function hasRole(bytes32 role, address account) external view returns (bool)
    ]"#,
);

abigen!(
    Ownable,
    r#"[
        function owner() external view returns (address)
        function transferOwnership(address newOwner) external
        function renounceOwnership() external
    ]"#,
);

abigen!(
    ProxyAdmin,
    r#"[
        function upgrade(address proxy, address implementation) external
    ]"#,
);

abigen!(
    UupsUpgradeable,
    r#"[
        function upgradeTo(address newImplementation) external
    ]"#,
);
