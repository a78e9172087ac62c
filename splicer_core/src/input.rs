/// A test case held in a corpus.
///
/// The mutation engine only ever looks at an input's bytes, and produces new
/// inputs from bytes, so those two conversions are all an input type needs.
pub trait Input: Clone + Send + Sync + std::fmt::Debug + 'static {
    fn as_bytes(&self) -> &[u8];

    fn from_bytes(bytes: Vec<u8>) -> Self;

    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Input for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self.as_slice()
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        bytes
    }
}

impl Input for Box<[u8]> {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        bytes.into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_and_boxed_slices_expose_their_bytes() {
        let data: Vec<u8> = Input::from_bytes(vec![1, 2, 3]);
        let boxed: Box<[u8]> = Input::from_bytes(vec![]);
        assert_eq!(data.as_bytes(), &[1, 2, 3]);
        assert_eq!(Input::len(&data), 3);
        assert!(!Input::is_empty(&data));
        assert!(Input::is_empty(&boxed));
    }
}
