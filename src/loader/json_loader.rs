use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::Error;
use crate::map::{
    Group, Layer, Map, Orientation, RenderOrder, StaggerAxis, TileId, TileImage, Tileset,
    TilesetSource,
};

#[derive(Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default = "default_orientation")]
    orientation: String,
    #[serde(default = "default_render_order")]
    renderorder: String,
    #[serde(default)]
    staggeraxis: Option<String>,
    #[serde(default)]
    hexsidelength: u32,
    #[serde(default)]
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetEntry>,
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" or "group" expected here
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    layers: Vec<JsonLayer>, // group children
}

#[derive(Deserialize)]
struct JsonTilesetEntry {
    firstgid: u32,
    /// Present for external tilesets referenced by file
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    def: JsonTilesetDef,
}

#[derive(Deserialize)]
struct JsonTilesetDef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tilewidth: u32,
    #[serde(default)]
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    image: Option<String>,
}

fn default_true() -> bool {
    true
}
fn one() -> f32 {
    1.0
}
fn default_orientation() -> String {
    "orthogonal".to_owned()
}
fn default_render_order() -> String {
    "right-down".to_owned()
}

/// Loads a map from a Tiled JSON file (`.json` or `.tmj`). Tileset image
/// paths resolve relative to the map file's directory.
pub fn load_map_file(path: impl AsRef<Path>) -> Result<Map, Error> {
    let p = path.as_ref();
    let ext = p.extension().and_then(|e| e.to_str());
    if !matches!(ext, Some("json") | Some("tmj")) {
        return Err(Error::UnsupportedFormat(p.display().to_string()));
    }

    let txt = fs::read_to_string(p)?;
    let base_dir = p
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));
    load_map_str(&txt, &base_dir)
}

/// Loads a map from Tiled JSON text. `base_dir` is the directory external
/// tilesets and image paths resolve against.
pub fn load_map_str(json: &str, base_dir: &Path) -> Result<Map, Error> {
    let raw: JsonMap = serde_json::from_str(json)?;

    let orientation = match raw.orientation.as_str() {
        "orthogonal" => Orientation::Orthogonal,
        "isometric" => Orientation::Isometric,
        "staggered" => Orientation::Staggered,
        "hexagonal" => Orientation::Hexagonal,
        _ => return Err(Error::UnsupportedOrientation),
    };
    let render_order = match raw.renderorder.as_str() {
        "right-down" => RenderOrder::RightDown,
        "right-up" => RenderOrder::RightUp,
        "left-down" => RenderOrder::LeftDown,
        "left-up" => RenderOrder::LeftUp,
        _ => return Err(Error::UnsupportedRenderOrder),
    };
    let stagger_axis = match raw.staggeraxis.as_deref() {
        Some("x") => Some(StaggerAxis::X),
        Some("y") => Some(StaggerAxis::Y),
        _ => None,
    };

    let cell_count = (raw.width * raw.height) as usize;
    let mut layers = Vec::new();
    let mut groups = Vec::new();
    for layer in raw.layers {
        match layer.kind.as_deref() {
            Some("tilelayer") | None => layers.push(tile_layer(layer, cell_count)?),
            Some("group") => {
                let mut children = Vec::new();
                for child in layer.layers {
                    if matches!(child.kind.as_deref(), Some("tilelayer") | None) {
                        children.push(tile_layer(child, cell_count)?);
                    }
                }
                groups.push(Group {
                    name: layer.name,
                    layers: children,
                });
            }
            // Object and image layers carry nothing renderable here.
            Some(_) => {}
        }
    }

    let mut tilesets = Vec::with_capacity(raw.tilesets.len());
    for entry in raw.tilesets {
        tilesets.push(tileset(entry, base_dir)?);
    }
    tilesets.sort_unstable_by_key(|t| t.first_gid);

    debug!(
        width = raw.width,
        height = raw.height,
        layers = layers.len(),
        groups = groups.len(),
        tilesets = tilesets.len(),
        "loaded map"
    );

    Ok(Map {
        width: raw.width,
        height: raw.height,
        tile_width: raw.tilewidth,
        tile_height: raw.tileheight,
        orientation,
        render_order,
        stagger_axis,
        hex_side_length: raw.hexsidelength,
        layers,
        groups,
        tilesets,
    })
}

fn tile_layer(layer: JsonLayer, cell_count: usize) -> Result<Layer, Error> {
    if layer.data.len() != cell_count {
        return Err(Error::InvalidLayerSize(layer.name));
    }
    Ok(Layer {
        name: layer.name,
        tiles: layer.data.into_iter().map(TileId).collect(),
        opacity: layer.opacity,
        visible: layer.visible,
    })
}

fn tileset(entry: JsonTilesetEntry, base_dir: &Path) -> Result<Tileset, Error> {
    let (def, base_dir) = match entry.source {
        Some(source) => {
            let ext = Path::new(&source).extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("json") | Some("tsj")) {
                return Err(Error::UnsupportedFormat(source));
            }
            let path = base_dir.join(&source);
            let txt = fs::read_to_string(&path)?;
            let def: JsonTilesetDef = serde_json::from_str(&txt)?;
            let dir = path
                .parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("./"));
            (def, dir)
        }
        None => (entry.def, base_dir.to_path_buf()),
    };

    let source = match def.image {
        Some(image) => TilesetSource::Atlas { image },
        None => TilesetSource::Collection {
            tiles: def
                .tiles
                .iter()
                .filter_map(|t| {
                    t.image.as_ref().map(|image| TileImage {
                        id: t.id,
                        image: image.clone(),
                    })
                })
                .collect(),
        },
    };
    let tile_count = if def.tilecount > 0 {
        def.tilecount
    } else {
        def.tiles.len() as u32
    };

    Ok(Tileset {
        name: def.name,
        first_gid: entry.firstgid,
        tile_count,
        columns: def.columns,
        tile_width: def.tilewidth,
        tile_height: def.tileheight,
        spacing: def.spacing,
        margin: def.margin,
        base_dir,
        source,
    })
}
