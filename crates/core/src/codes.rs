//! Province and category code tables.
//!
//! Lookups are exact and case-sensitive. Callers get `None` for anything not in
//! the tables and decide for themselves whether that is an error.

/// The 38 Indonesian provinces and their two-digit codes.
pub const PROVINCES: [(&str, &str); 38] = [
    ("Aceh", "01"),
    ("Sumatera Utara", "02"),
    ("Sumatera Barat", "03"),
    ("Riau", "04"),
    ("Jambi", "05"),
    ("Sumatera Selatan", "06"),
    ("Bengkulu", "07"),
    ("Lampung", "08"),
    ("Kepulauan Bangka Belitung", "09"),
    ("Kepulauan Riau", "10"),
    ("DKI Jakarta", "11"),
    ("Jawa Barat", "12"),
    ("Jawa Tengah", "13"),
    ("DI Yogyakarta", "14"),
    ("Jawa Timur", "15"),
    ("Banten", "16"),
    ("Bali", "17"),
    ("Nusa Tenggara Barat", "18"),
    ("Nusa Tenggara Timur", "19"),
    ("Kalimantan Barat", "20"),
    ("Kalimantan Tengah", "21"),
    ("Kalimantan Selatan", "22"),
    ("Kalimantan Timur", "23"),
    ("Kalimantan Utara", "24"),
    ("Sulawesi Utara", "25"),
    ("Sulawesi Tengah", "26"),
    ("Sulawesi Selatan", "27"),
    ("Sulawesi Tenggara", "28"),
    ("Gorontalo", "29"),
    ("Sulawesi Barat", "30"),
    ("Maluku", "31"),
    ("Maluku Utara", "32"),
    ("Papua", "33"),
    ("Papua Barat", "34"),
    ("Papua Barat Daya", "35"),
    ("Papua Selatan", "36"),
    ("Papua Tengah", "37"),
    ("Papua Pegunungan", "38"),
];

/// Audition categories and their one-letter codes.
pub const CATEGORIES: [(&str, char); 3] = [("Acting", 'A'), ("Vocal", 'V'), ("Model", 'M')];

/// Two-digit code for a province name.
#[must_use]
pub fn lookup_province_code(name: &str) -> Option<&'static str> {
    PROVINCES
        .iter()
        .find(|(province, _)| *province == name)
        .map(|(_, code)| *code)
}

/// One-letter code for a category name.
#[must_use]
pub fn lookup_category_code(name: &str) -> Option<char> {
    CATEGORIES
        .iter()
        .find(|(category, _)| *category == name)
        .map(|(_, code)| *code)
}

/// Province name for a two-digit code.
#[must_use]
pub fn province_name(code: &str) -> Option<&'static str> {
    PROVINCES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Canonical `&'static` form of a known province code.
#[must_use]
pub fn canonical_province_code(code: &str) -> Option<&'static str> {
    PROVINCES.iter().find(|(_, c)| *c == code).map(|(_, c)| *c)
}

/// Category name for a one-letter code.
#[must_use]
pub fn category_name(code: char) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}
