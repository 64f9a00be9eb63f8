//! Built-in defaults.

use super::{SettingsError, SettingsResult};

pub const DEFAULT_ZONE_COUNT: u32 = 2;
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_VPC_TENANCY: &str = "default";
pub const DEFAULT_CREATE_PRIVATE_SUBNETS: bool = true;
pub const DEFAULT_CREATE_PROTECTED_SUBNETS: bool = false;

/// Public subnets: four /20 blocks in the upper half of 10.0.0.0/16.
pub const PUBLIC_SUBNET_CIDRS: [&str; 4] = [
    "10.0.128.0/20",
    "10.0.144.0/20",
    "10.0.160.0/20",
    "10.0.176.0/20",
];

/// Private subnets: four /19 blocks in the lower half.
pub const PRIVATE_SUBNET_CIDRS: [&str; 4] = [
    "10.0.0.0/19",
    "10.0.32.0/19",
    "10.0.64.0/19",
    "10.0.96.0/19",
];

/// Protected subnets: four /21 blocks after the public range.
pub const PROTECTED_SUBNET_CIDRS: [&str; 4] = [
    "10.0.192.0/21",
    "10.0.200.0/21",
    "10.0.208.0/21",
    "10.0.216.0/21",
];

/// The first `count` entries of a default table.
pub fn slice_table(table: &[&str], count: usize, key: &str) -> SettingsResult<Vec<String>> {
    if count > table.len() {
        return Err(SettingsError::IndexOutOfRange {
            list: format!("default {}", key),
            requested: count,
            available: table.len(),
        });
    }
    Ok(table[..count].iter().map(|cidr| cidr.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_table() {
        let cidrs = slice_table(&PUBLIC_SUBNET_CIDRS, 2, "publicSubnetCidrs").unwrap();
        assert_eq!(cidrs, vec!["10.0.128.0/20", "10.0.144.0/20"]);
        assert!(slice_table(&PRIVATE_SUBNET_CIDRS, 0, "privateSubnetCidrs")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_slice_table_past_end() {
        let err = slice_table(&PROTECTED_SUBNET_CIDRS, 5, "protectedSubnetCidrs").unwrap_err();
        assert_eq!(
            err,
            SettingsError::IndexOutOfRange {
                list: "default protectedSubnetCidrs".to_string(),
                requested: 5,
                available: 4,
            }
        );
    }
}
