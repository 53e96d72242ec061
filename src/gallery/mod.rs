//! Gallery state
//!
//! Holds the ordered photo list, the current scroll position, and the per-photo
//! like flags, plus the pure projection the UI renders from.

/// A single photo in the gallery
#[derive(Clone, Debug)]
pub struct Photo {
    /// Source URL of the image
    pub url: String,
    /// Whether the user has liked this photo
    pub liked: bool,
}

/// Projection of one photo for rendering
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoView {
    /// Index into the gallery
    pub index: usize,
    /// Source URL of the image
    pub url: String,
    /// True for the photo at the current scroll position
    pub active: bool,
    /// True if the photo is liked
    pub liked: bool,
}

/// The photo gallery: an ordered photo list and a current position
///
/// `current_index` is always within `[0, len - 1]`; all operations are total
/// and leave the state unchanged when they would move out of bounds.
pub struct Gallery {
    photos: Vec<Photo>,
    current_index: usize,
}

impl Gallery {
    /// Create a gallery from an ordered list of photo URLs
    pub fn new(urls: &[String]) -> Self {
        Self {
            photos: urls
                .iter()
                .map(|url| Photo {
                    url: url.clone(),
                    liked: false,
                })
                .collect(),
            current_index: 0,
        }
    }

    /// Number of photos
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    /// True if the gallery holds no photos
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Index of the current photo
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The photo list
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Move to the next photo; no-op at the last index
    pub fn advance(&mut self) {
        if self.current_index + 1 < self.photos.len() {
            self.current_index += 1;
        }
    }

    /// Move to the previous photo; no-op at index 0
    pub fn retreat(&mut self) {
        if self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// Flip the liked flag of the photo at `index`; no-op when out of range
    pub fn toggle_like(&mut self, index: usize) {
        if let Some(photo) = self.photos.get_mut(index) {
            photo.liked = !photo.liked;
        }
    }

    /// Project the gallery into its render form
    ///
    /// Pure function of the state: identical state produces identical output.
    pub fn view(&self) -> Vec<PhotoView> {
        self.photos
            .iter()
            .enumerate()
            .map(|(i, photo)| PhotoView {
                index: i,
                url: photo.url.clone(),
                active: i == self.current_index,
                liked: photo.liked,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gallery(n: usize) -> Gallery {
        let urls: Vec<String> = (0..n).map(|i| format!("photo-{}", i)).collect();
        Gallery::new(&urls)
    }

    #[test]
    fn test_index_stays_in_bounds() {
        let mut g = gallery(5);

        // A mixed sequence that repeatedly pushes past both ends
        let moves = [1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1, 1, -1];
        for step in moves {
            if step > 0 {
                g.advance();
            } else {
                g.retreat();
            }
            assert!(g.current_index() < g.len());
        }
    }

    #[test]
    fn test_advance_at_last_is_noop() {
        let mut g = gallery(3);
        g.advance();
        g.advance();
        assert_eq!(g.current_index(), 2);

        g.advance();
        g.advance();
        assert_eq!(g.current_index(), 2);
    }

    #[test]
    fn test_retreat_at_first_is_noop() {
        let mut g = gallery(3);
        g.retreat();
        g.retreat();
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn test_toggle_like_involution() {
        let mut g = gallery(4);
        assert!(!g.photos()[2].liked);

        g.toggle_like(2);
        assert!(g.photos()[2].liked);

        g.toggle_like(2);
        assert!(!g.photos()[2].liked);
    }

    #[test]
    fn test_toggle_like_out_of_range_is_noop() {
        let mut g = gallery(2);
        g.toggle_like(7);
        assert!(g.photos().iter().all(|p| !p.liked));
    }

    #[test]
    fn test_view_is_pure() {
        let mut g = gallery(4);
        g.advance();
        g.toggle_like(1);

        let first = g.view();
        let second = g.view();
        assert_eq!(first, second);
    }

    #[test]
    fn test_view_marks_active_and_liked() {
        let mut g = gallery(4);
        g.advance();
        g.toggle_like(3);

        let view = g.view();
        assert_eq!(view.len(), 4);
        assert!(view[1].active);
        assert_eq!(view.iter().filter(|v| v.active).count(), 1);
        assert!(view[3].liked);
        assert_eq!(view.iter().filter(|v| v.liked).count(), 1);
    }
}
