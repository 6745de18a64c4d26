//! Order-preserving fan-out over scoped worker threads

/// Apply `f` to every item on up to `workers` scoped threads
///
/// Items are split into contiguous chunks and the results are concatenated
/// in input order, so the output never depends on scheduling. A panic in a
/// worker is resumed on the calling thread.
pub(crate) fn map_parallel<T, R, F>(items: Vec<T>, workers: usize, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if workers <= 1 || items.len() <= 1 {
        return items.into_iter().map(f).collect();
    }

    let chunk_len = items.len().div_ceil(workers);
    let mut chunks = Vec::with_capacity(workers);
    let mut iter = items.into_iter();
    loop {
        let chunk: Vec<T> = iter.by_ref().take(chunk_len).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }

    let f = &f;
    let partials = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| s.spawn(move |_| chunk.into_iter().map(f).collect::<Vec<R>>()))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|e| std::panic::resume_unwind(e));

    partials.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_input_order() {
        let items: Vec<usize> = (0..100).collect();
        let out = map_parallel(items, 7, |x| x * 2);
        let expected: Vec<usize> = (0..100).map(|x| x * 2).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_inline_when_single_worker() {
        let out = map_parallel(vec![1, 2, 3], 1, |x| x + 1);
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[test]
    fn test_more_workers_than_items() {
        let out = map_parallel(vec![5, 6], 16, |x| x);
        assert_eq!(out, vec![5, 6]);
    }

    #[test]
    fn test_empty_input() {
        let out: Vec<u8> = map_parallel(Vec::<u8>::new(), 4, |x| x);
        assert!(out.is_empty());
    }
}
