use crate::model::{Atlas, Placement};
use serde_json::{Value, json};

fn placement_fields<K>(p: &Placement<K>) -> (Value, Value) {
    let frame = json!({"x": p.frame.x, "y": p.frame.y, "w": p.frame.w, "h": p.frame.h});
    let source_size = json!({"w": p.source_size.0, "h": p.source_size.1});
    (frame, source_size)
}

/// Serialize the whole `Atlas` as a JSON object `{ pages, meta }` (array-of-pages style).
/// Frame sizes include padding; `sourceSize` is the original input size.
pub fn to_json_array<K: ToString>(atlas: &Atlas<K>) -> Value {
    let pages_val = atlas
        .pages
        .iter()
        .map(|page| {
            let rects_val: Vec<Value> = page
                .placements
                .iter()
                .map(|p| {
                    let (frame, source_size) = placement_fields(p);
                    json!({
                        "key": p.key.to_string(),
                        "index": p.handle.index(),
                        "frame": frame,
                        "rotated": p.rotated,
                        "sourceSize": source_size,
                    })
                })
                .collect();
            json!({
                "id": page.id,
                "width": page.width,
                "height": page.height,
                "occupancy": page.occupancy(),
                "rects": rects_val,
            })
        })
        .collect::<Vec<_>>();
    json!({"pages": pages_val, "meta": &atlas.meta})
}

/// Flatten placements keyed by name, with page id/size hints.
/// Shape: `{ frames: { name: { frame, rotated, sourceSize, page, pageSize } }, meta }`.
/// Later duplicates of a key overwrite earlier ones.
pub fn to_json_hash<K: ToString>(atlas: &Atlas<K>) -> Value {
    let mut frames = serde_json::Map::new();
    for page in &atlas.pages {
        for p in &page.placements {
            let (frame, source_size) = placement_fields(p);
            frames.insert(
                p.key.to_string(),
                json!({
                    "frame": frame,
                    "rotated": p.rotated,
                    "sourceSize": source_size,
                    "page": page.id,
                    "pageSize": {"w": page.width, "h": page.height},
                }),
            );
        }
    }
    json!({ "frames": frames, "meta": &atlas.meta })
}
