//! Photo loading
//!
//! Downloads the gallery's externally hosted images once at startup on a
//! background thread and streams the decoded RGBA images back over a channel.
//! The UI shows placeholders until each photo arrives; a failed download just
//! leaves its placeholder in place.

use crossbeam_channel::{Receiver, Sender};

/// A downloaded, decoded photo
pub struct LoadedPhoto {
    /// Index into the gallery's photo list
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data
    pub rgba: Vec<u8>,
}

/// Background photo loader
///
/// The loader thread is detached; it notices the dropped receiver on its next
/// send, so shutdown is never blocked on a slow download.
pub struct PhotoLoader {
    receiver: Receiver<LoadedPhoto>,
}

impl PhotoLoader {
    /// Start fetching every URL in order
    pub fn start(urls: Vec<String>) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<LoadedPhoto>();

        let spawned = std::thread::Builder::new()
            .name("photo-loader".to_string())
            .spawn(move || Self::loader_thread(urls, sender));

        if let Err(e) = spawned {
            log::warn!("Failed to spawn photo loader thread: {}", e);
        }

        Self { receiver }
    }

    fn loader_thread(urls: Vec<String>, sender: Sender<LoadedPhoto>) {
        log::info!("Fetching {} photos", urls.len());

        let client = match reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to build HTTP client: {}", e);
                return;
            }
        };

        for (index, url) in urls.iter().enumerate() {
            let bytes = match client.get(url).send().and_then(|r| r.error_for_status()) {
                Ok(response) => match response.bytes() {
                    Ok(b) => b,
                    Err(e) => {
                        log::warn!("Failed to read photo {}: {}", url, e);
                        continue;
                    }
                },
                Err(e) => {
                    log::warn!("Failed to fetch photo {}: {}", url, e);
                    continue;
                }
            };

            match decode_photo(&bytes) {
                Some((width, height, rgba)) => {
                    let photo = LoadedPhoto {
                        index,
                        width,
                        height,
                        rgba,
                    };
                    // Receiver dropped means the app is shutting down
                    if sender.send(photo).is_err() {
                        return;
                    }
                }
                None => {
                    log::warn!("Failed to decode photo {}", url);
                }
            }
        }

        log::info!("Photo fetch complete");
    }

    /// Drain every photo that has arrived since the last poll
    pub fn poll(&self) -> Vec<LoadedPhoto> {
        self.receiver.try_iter().collect()
    }
}

/// Decode image bytes into RGBA pixels
pub(crate) fn decode_photo(bytes: &[u8]) -> Option<(u32, u32, Vec<u8>)> {
    let image = image::load_from_memory(bytes).ok()?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Some((width, height, rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_photo_roundtrip() {
        // Encode a tiny image in memory, then decode it back
        let mut buffer = std::io::Cursor::new(Vec::new());
        let img = image::RgbaImage::from_pixel(2, 3, image::Rgba([10, 20, 30, 255]));
        img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();

        let (width, height, rgba) = decode_photo(buffer.get_ref()).unwrap();
        assert_eq!((width, height), (2, 3));
        assert_eq!(rgba.len(), 2 * 3 * 4);
        assert_eq!(&rgba[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_photo_rejects_garbage() {
        assert!(decode_photo(b"not an image").is_none());
    }
}
