pub const STATUS_OK: u16 = 200;
pub const STATUS_MODEL_LOADING: u16 = 503;

/// Raw reply from the inference endpoint: an image on success, an error
/// document otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn is_loading(&self) -> bool {
        self.status == STATUS_MODEL_LOADING
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
