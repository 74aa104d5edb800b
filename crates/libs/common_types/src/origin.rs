use serde::{Deserialize, Serialize};

/// Where the current image came from. Decides which endpoint analyzes it.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Upload,
    Camera,
}
