//! Cursor following and describe batching shared by the stages.

use crate::control_plane::{Page, MAX_DESCRIBE_BATCH};
use crate::error::{ApiError, DiscoveryError};
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

/// Follow `next_token` until the API stops returning one.
///
/// A cursor seen twice, or more than `max_pages` pages, is reported as an
/// inconsistent response instead of looping forever.
pub async fn collect_pages<T, F, Fut>(
    operation: &'static str,
    max_pages: usize,
    mut fetch: F,
) -> Result<Vec<T>, DiscoveryError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut token: Option<String> = None;
    let mut seen = HashSet::new();

    for page_no in 1..=max_pages {
        let page = fetch(token.take())
            .await
            .map_err(|e| DiscoveryError::api(operation, e))?;
        debug!("{}: page {} returned {} items", operation, page_no, page.items.len());
        items.extend(page.items);

        match page.next_token {
            None => return Ok(items),
            Some(next) => {
                if !seen.insert(next.clone()) {
                    return Err(DiscoveryError::Inconsistent(format!(
                        "{}: pagination cursor repeated after {} pages",
                        operation, page_no
                    )));
                }
                token = Some(next);
            }
        }
    }

    Err(DiscoveryError::Inconsistent(format!(
        "{}: pagination did not finish within {} pages",
        operation, max_pages
    )))
}

/// Split `ids` into describe-sized batches.
pub fn batches(ids: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    ids.chunks(batch_size.clamp(1, MAX_DESCRIBE_BATCH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{}", i)).collect()
    }

    #[test]
    fn test_batches_respect_limit() {
        let all = ids(250);
        let sizes: Vec<usize> = batches(&all, 100).map(<[String]>::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let sizes: Vec<usize> = batches(&all, 1000).map(<[String]>::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        assert_eq!(batches(&ids(3), 0).count(), 3);
    }

    #[tokio::test]
    async fn test_collect_pages_follows_cursor() {
        let calls = Mutex::new(Vec::new());
        let result = collect_pages("ListTasks", 10, |token: Option<String>| {
            calls.lock().unwrap().push(token.clone());
            async move {
                Ok(match token.as_deref() {
                    None => Page {
                        items: vec![1, 2],
                        next_token: Some("a".to_string()),
                    },
                    Some("a") => Page {
                        items: vec![3],
                        next_token: Some("b".to_string()),
                    },
                    _ => Page::last(vec![4]),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(result, vec![1, 2, 3, 4]);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_collect_pages_detects_repeating_cursor() {
        let err = collect_pages("ListTasks", 10, |_token| async {
            Ok(Page {
                items: vec![1],
                next_token: Some("same".to_string()),
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DiscoveryError::Inconsistent(ref m) if m.contains("repeated")));
    }

    #[tokio::test]
    async fn test_collect_pages_ceiling() {
        let counter = Mutex::new(0u32);
        let err = collect_pages("DescribeInstances", 3, |_token| {
            let n = {
                let mut c = counter.lock().unwrap();
                *c += 1;
                *c
            };
            async move {
                Ok(Page {
                    items: vec![n],
                    next_token: Some(format!("t{}", n)),
                })
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DiscoveryError::Inconsistent(ref m) if m.contains("3 pages")));
        assert_eq!(*counter.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_api_error() {
        let err = collect_pages::<u32, _, _>("ListTasks", 10, |_token| async {
            Err(ApiError::new("boom"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DiscoveryError::Api { context: "ListTasks", .. }));
    }
}
