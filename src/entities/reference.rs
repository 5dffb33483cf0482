//! Reference data for Algerian administrative geography and French dates.
//!
//! Tables are sorted consts looked up by binary search where the key order
//! allows it.

/// The 48 wilayas, sorted by administrative code.
pub const WILAYAS: &[(u8, &str)] = &[
    (1, "Adrar"),
    (2, "Chlef"),
    (3, "Laghouat"),
    (4, "Oum El Bouaghi"),
    (5, "Batna"),
    (6, "Béjaïa"),
    (7, "Biskra"),
    (8, "Béchar"),
    (9, "Blida"),
    (10, "Bouira"),
    (11, "Tamanrasset"),
    (12, "Tébessa"),
    (13, "Tlemcen"),
    (14, "Tiaret"),
    (15, "Tizi Ouzou"),
    (16, "Alger"),
    (17, "Djelfa"),
    (18, "Jijel"),
    (19, "Sétif"),
    (20, "Saïda"),
    (21, "Skikda"),
    (22, "Sidi Bel Abbès"),
    (23, "Annaba"),
    (24, "Guelma"),
    (25, "Constantine"),
    (26, "Médéa"),
    (27, "Mostaganem"),
    (28, "M'Sila"),
    (29, "Mascara"),
    (30, "Ouargla"),
    (31, "Oran"),
    (32, "El Bayadh"),
    (33, "Illizi"),
    (34, "Bordj Bou Arréridj"),
    (35, "Boumerdès"),
    (36, "El Tarf"),
    (37, "Tindouf"),
    (38, "Tissemsilt"),
    (39, "El Oued"),
    (40, "Khenchela"),
    (41, "Souk Ahras"),
    (42, "Tipaza"),
    (43, "Mila"),
    (44, "Aïn Defla"),
    (45, "Naâma"),
    (46, "Aïn Témouchent"),
    (47, "Ghardaïa"),
    (48, "Relizane"),
];

/// French month names with their numbers, sorted by name for binary search.
const FRENCH_MONTHS: &[(&str, u32)] = &[
    ("aout", 8),
    ("août", 8),
    ("avril", 4),
    ("décembre", 12),
    ("février", 2),
    ("janvier", 1),
    ("juillet", 7),
    ("juin", 6),
    ("mai", 5),
    ("mars", 3),
    ("novembre", 11),
    ("octobre", 10),
    ("septembre", 9),
];

/// Institution keywords that anchor institution recognition, lowercase.
pub const INSTITUTION_KEYWORDS: &[&str] = &[
    "assemblée populaire",
    "conseil constitutionnel",
    "conseil d'état",
    "cour des comptes",
    "cour suprême",
    "direction générale",
    "ministère",
    "présidence de la république",
    "wali",
];

/// Wilaya name for an administrative code.
pub fn wilaya_name(code: u8) -> Option<&'static str> {
    WILAYAS
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| WILAYAS[i].1)
}

/// Administrative code for a wilaya name, case-insensitive.
pub fn wilaya_code(name: &str) -> Option<u8> {
    let needle = name.trim().to_lowercase();
    WILAYAS
        .iter()
        .find(|(_, n)| n.to_lowercase() == needle)
        .map(|&(c, _)| c)
}

/// Month number for a French month name, case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let needle = name.trim().to_lowercase();
    FRENCH_MONTHS
        .binary_search_by(|&(n, _)| n.cmp(needle.as_str()))
        .ok()
        .map(|i| FRENCH_MONTHS[i].1)
}
