use crossbeam_channel::Sender;
use tessera_assets::{chunk_asset_url, decode_chunk, AssetError, ChunkScene};
use tessera_core::types::ChunkCoord;
use tessera_world::FetchTicket;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Why a chunk could not be loaded. Every variant is handled the same way:
/// the chunk goes back to absent and is retried later.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid chunk asset: {0}")]
    Decode(#[from] AssetError),
}

/// Result of one chunk fetch, delivered to the run loop.
#[derive(Debug)]
pub struct FetchEvent {
    pub coord: ChunkCoord,
    pub ticket: FetchTicket,
    pub result: Result<ChunkScene, FetchError>,
}

/// Starts chunk downloads on the browser event loop and posts their results
/// to a channel drained once per frame.
pub struct ChunkFetcher {
    base_url: String,
    sender: Sender<FetchEvent>,
}

impl ChunkFetcher {
    pub fn new(base_url: impl Into<String>, sender: Sender<FetchEvent>) -> Self {
        Self {
            base_url: base_url.into(),
            sender,
        }
    }

    pub fn url_for(&self, coord: ChunkCoord) -> String {
        chunk_asset_url(&self.base_url, coord)
    }

    pub fn request(&self, coord: ChunkCoord, ticket: FetchTicket) {
        let url = self.url_for(coord);
        let sender = self.sender.clone();
        log::debug!("Fetching chunk {} from {}", coord.id(), url);
        wasm_bindgen_futures::spawn_local(async move {
            let result = match fetch_bytes(&url).await {
                Ok(bytes) => decode_chunk(&bytes).map_err(FetchError::from),
                Err(e) => Err(e),
            };
            // The receiver only disappears with the application.
            let _ = sender.send(FetchEvent {
                coord,
                ticket,
                result,
            });
        });
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    let network = |e: JsValue| FetchError::Network {
        url: url.to_owned(),
        message: format!("{e:?}"),
    };

    let window = web_sys::window().ok_or_else(|| network(JsValue::from_str("no global window")))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(network)?
        .dyn_into()
        .map_err(network)?;

    if !response.ok() {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status: response.status(),
        });
    }

    let buffer = JsFuture::from(response.array_buffer().map_err(network)?)
        .await
        .map_err(network)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_uses_base() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let fetcher = ChunkFetcher::new("", tx.clone());
        assert_eq!(fetcher.url_for(ChunkCoord::new(-1, 2)), "chunks/-1_2.glb");
        let fetcher = ChunkFetcher::new("http://localhost:3000", tx);
        assert_eq!(
            fetcher.url_for(ChunkCoord::new(0, 0)),
            "http://localhost:3000/chunks/0_0.glb"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::Status {
            url: "chunks/9_9.glb".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for chunks/9_9.glb");
        let err = FetchError::from(AssetError::NoScene);
        assert_eq!(err.to_string(), "invalid chunk asset: glTF file has no scene");
    }
}
