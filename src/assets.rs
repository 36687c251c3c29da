use crate::error::MapError;
use crate::map::MapData;
use rust_embed::RustEmbed;
use std::borrow::Cow;

pub const DEFAULT_MAP: &str = "maps/castle.json";

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Asset;

pub fn get_asset_bytes(name: &str) -> Option<Cow<'static, [u8]>> {
    Asset::get(name).map(|f| f.data)
}

/// Parses a map shipped inside the binary.
pub fn load_embedded_map(name: &str) -> Result<MapData, MapError> {
    let bytes = get_asset_bytes(name).ok_or_else(|| MapError::MissingAsset(name.to_string()))?;
    MapData::from_json(&String::from_utf8_lossy(&bytes))
}
