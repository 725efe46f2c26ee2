//! Shared fixtures for engine tests

// Not every test binary uses every fixture.
#![allow(dead_code)]

use taxrec_engine::gbif::{BackboneClient, GbifConfig};
use taxrec_engine::store::{RankInfo, RankTable};

/// The seeded rank ladder, mirroring the migration
pub fn rank_table() -> RankTable {
    RankTable::new(vec![
        rank("KINGDOM", 10, "reg.", "kg"),
        rank("PHYLUM", 20, "phyl.", "phy"),
        rank("CLASS", 30, "cl.", "cl"),
        rank("ORDER", 40, "ord.", "ord"),
        rank("FAMILY", 50, "fam.", "fam"),
        rank("TRIBE", 55, "trib.", "trib"),
        rank("GENUS", 60, "gen.", "gn"),
        rank("SUBGENUS", 65, "subgen.", "sgn"),
        rank("SUPERSPECIES", 68, "supersp.", "ssp+"),
        rank("SPECIES", 70, "sp.", "sp"),
        rank("SUBSPECIES", 80, "subsp.", "ssp"),
        rank("VARIETY", 90, "var.", "var"),
        rank("SUBVARIETY", 95, "subvar.", "svar"),
        rank("FORM", 100, "f.", "form"),
    ])
}

pub fn rank(name: &str, level: i32, marker: &str, code: &str) -> RankInfo {
    RankInfo {
        rank_name: name.to_string(),
        rank_level: level,
        backbone_marker: marker.to_string(),
        user_code: code.to_string(),
    }
}

/// A backbone client pointed at a mock server
pub fn backbone_client(server_uri: &str) -> BackboneClient {
    BackboneClient::new(GbifConfig::default().with_base_url(server_uri))
        .expect("mock client config is valid")
}
