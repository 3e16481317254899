use serde::ser::Serialize;

pub fn serialize<T: ?Sized>(v: &T) -> String
where
    T: Serialize,
{
    match serde_json::to_string(&v) {
        Ok(s) => s,
        Err(e) => format!("serialization error: {}", e),
    }
}
