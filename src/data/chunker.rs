// ============================================================
// Layer 4 — Token Window Chunker
// ============================================================
// Splits a long token sequence into overlapping windows no wider
// than the model's context width.
//
// The model only ever sees `context_maxlen` tokens. A document
// longer than that is read window by window; the overlap makes
// sure an answer near a boundary appears whole in some window.
//
// Example with window=5, overlap=2 (stride 3):
//   Tokens:  A B C D E F G H I J
//   Window 1: A B C D E          (0..5)
//   Window 2: D E F G H          (3..8)
//   Window 3: G H I J            (6..10, last window)

pub struct Chunker {
    window:  usize,
    overlap: usize,
}

impl Chunker {
    /// # Panics
    /// Panics if overlap >= window, because the stride would be 0.
    pub fn new(window: usize, overlap: usize) -> Self {
        assert!(
            overlap < window,
            "overlap ({}) must be less than window ({})",
            overlap,
            window
        );
        Self { window, overlap }
    }

    /// Borrowed windows over `tokens`, in order. Empty input gives
    /// no windows.
    pub fn windows<'a, T>(&self, tokens: &'a [T]) -> Vec<&'a [T]> {
        if tokens.is_empty() {
            return Vec::new();
        }

        let stride = self.window - self.overlap;
        let mut windows = Vec::new();
        let mut start   = 0usize;
        loop {
            let end = (start + self.window).min(tokens.len());
            windows.push(&tokens[start..end]);
            if end == tokens.len() {
                break;
            }
            start += stride;
        }
        windows
    }
}
