use uuid::Uuid;

/// Fresh object identifier in the upper-case hyphenated form `.nmodel` files use.
pub fn new_uuid() -> String {
    Uuid::new_v4().hyphenated().to_string().to_uppercase()
}
