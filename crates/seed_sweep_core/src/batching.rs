use std::num::NonZeroUsize;

/// Maximum number of entries accepted by one batch publish call.
pub const SQS_BATCH_SEND_LIMIT: usize = 10;

/// Groups an iterator into consecutive batches of `limit` items.
///
/// Every batch is full except possibly the last one, which holds the
/// remainder. An empty batch is never yielded.
#[derive(Debug, Clone)]
pub struct Batches<I> {
    inner: I,
    limit: NonZeroUsize,
}

pub fn batched<I: Iterator>(inner: I, limit: NonZeroUsize) -> Batches<I> {
    Batches { inner, limit }
}

pub fn send_limit() -> NonZeroUsize {
    NonZeroUsize::new(SQS_BATCH_SEND_LIMIT).unwrap_or(NonZeroUsize::MIN)
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<I::Item> = self.inner.by_ref().take(self.limit.get()).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lower, upper) = self.inner.size_hint();
        let limit = self.limit.get();
        (lower.div_ceil(limit), upper.map(|value| value.div_ceil(limit)))
    }
}
