use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tspub_core::models::ProductBundle;

pub fn product() -> Value {
    json!({
        "name": "Oak Chair",
        "product_type": "3d_model",
        "price_usd": 19.99,
        "tags": ["chair", "furniture"]
    })
}

/// One product file, one thumbnail and two certifications.
pub fn simple_bundle(dir: &Path) -> ProductBundle {
    fs::write(dir.join("chair.max"), b"max scene").unwrap();
    fs::write(dir.join("thumb.png"), b"png").unwrap();

    write_bundle(
        dir,
        json!({
            "product": product(),
            "files": [
                { "file_name": "chair.max", "type": "product_file", "file_format": "3ds_max", "is_native": true }
            ],
            "previews": [
                { "file_name": "thumb.png", "type": "thumbnail", "thumbnail_type": "regular" }
            ],
            "certifications": ["stemcell", "checkmate_lite"]
        }),
    )
}

/// A turntable directory with three frames and a hidden entry.
pub fn turntable_bundle(dir: &Path) -> ProductBundle {
    let frames = dir.join("turntable");
    fs::create_dir(&frames).unwrap();
    for name in ["c.png", "a.png", "b.png", ".DS_Store"] {
        fs::write(frames.join(name), name.as_bytes()).unwrap();
    }

    write_bundle(
        dir,
        json!({
            "product": product(),
            "files": [],
            "previews": [
                { "file_name": "turntable", "type": "turntable" }
            ],
            "certifications": []
        }),
    )
}

/// Two files where `broken.obj` fails processing, a thumbnail and one certification.
pub fn bundle_with_broken_file(dir: &Path) -> ProductBundle {
    fs::write(dir.join("chair.max"), b"max scene").unwrap();
    fs::write(dir.join("broken.obj"), b"obj").unwrap();
    fs::write(dir.join("extras.zip"), b"zip").unwrap();
    fs::write(dir.join("thumb.png"), b"png").unwrap();

    write_bundle(
        dir,
        json!({
            "product": product(),
            "files": [
                { "file_name": "chair.max", "type": "product_file", "file_format": "3ds_max" },
                { "file_name": "broken.obj", "type": "product_file", "file_format": "obj" },
                { "file_name": "extras.zip", "type": "customer_file", "description": "extras" }
            ],
            "previews": [
                { "file_name": "thumb.png", "type": "thumbnail" }
            ],
            "certifications": ["stemcell"]
        }),
    )
}

pub fn write_bundle(dir: &Path, description: Value) -> ProductBundle {
    fs::write(
        dir.join("product.json"),
        serde_json::to_string_pretty(&description).unwrap(),
    )
    .unwrap();
    ProductBundle::load(dir).unwrap()
}
