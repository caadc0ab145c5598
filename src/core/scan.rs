use serde_json::Value;

pub const DATA_IMAGE_PREFIX: &str = "data:image/";

/// JSON paths (`$.a.b[0]`) of every string that is an inlined base64 image.
pub fn find_data_image_urls(value: &Value) -> Vec<String> {
    let mut hits = Vec::new();
    visit(value, "$".to_string(), &mut hits);
    hits
}

fn visit(value: &Value, path: String, hits: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if s.trim_start().starts_with(DATA_IMAGE_PREFIX) {
                hits.push(path);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                visit(item, format!("{}[{}]", path, i), hits);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                visit(item, format!("{}.{}", path, key), hits);
            }
        }
        _ => {}
    }
}
