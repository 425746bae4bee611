// Error codes implementation
// Stable, machine-readable codes for every clinical error category.
// Codes never change meaning once published; new codes are appended.

pub mod domain {
    pub const OUT_OF_DOMAIN: &str = "DOMAIN_1001";
    pub const MISSING_INPUT: &str = "DOMAIN_1002";
}

pub mod reference {
    pub const MISSING_REFERENCE_DATA: &str = "REFDATA_2001";
    pub const MISSING_CATEGORY: &str = "REFDATA_2002";
    pub const INVALID_REFERENCE_DATA: &str = "REFDATA_2003";
}

pub mod dosing {
    pub const NO_MATCHING_BRACKET: &str = "DOSING_3001";
}
