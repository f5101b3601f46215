//! Recursive listing helpers
//!
//! Work on any [`Folder`]; on a [`MultiFolder`](super::MultiFolder) the
//! storage tag of every object is preserved.

use crate::domain::path::{join_path, trim_root, DELIMITER};
use crate::domain::ports::{Folder, FolderRef, Object};
use crate::error::Result;
use std::collections::VecDeque;

/// All objects below `folder`, named relative to it
pub async fn list_folder_recursively(folder: &dyn Folder) -> Result<Vec<Object>> {
    list_folder_recursively_with_filter(folder, |_| true).await
}

/// All objects below `folder`, descending only into sub-folders whose path
/// relative to `folder` passes `selector`
pub async fn list_folder_recursively_with_filter<F>(
    folder: &dyn Folder,
    selector: F,
) -> Result<Vec<Object>>
where
    F: Fn(&str) -> bool,
{
    let root_path = folder.path().to_string();
    let (mut objects, sub_folders) = folder.list_folder().await?;

    let mut queue: VecDeque<FolderRef> = VecDeque::new();
    let select = |subs: Vec<FolderRef>, queue: &mut VecDeque<FolderRef>| {
        queue.extend(
            subs.into_iter()
                .filter(|sub| selector(trim_root(sub.path(), &root_path))),
        );
    };
    select(sub_folders, &mut queue);

    while let Some(sub) = queue.pop_front() {
        let (found, sub_folders) = sub.list_folder().await?;
        let prefix = trim_root(sub.path(), &root_path);
        objects.extend(found.into_iter().map(|object| prefixed(object, prefix)));
        select(sub_folders, &mut queue);
    }
    Ok(objects)
}

/// Objects matching `prefix`
///
/// A prefix without a trailing delimiter naming an existing object yields
/// just that object. Otherwise the prefix is treated as a folder and listed
/// recursively. Leading delimiters are ignored.
pub async fn list_folder_recursively_with_prefix(
    folder: &dyn Folder,
    prefix: &str,
) -> Result<Vec<Object>> {
    let may_be_file = !prefix.is_empty() && !prefix.ends_with(DELIMITER);
    let prefix = prefix.trim_matches(DELIMITER);

    if may_be_file {
        let (dir, file) = prefix.rsplit_once(DELIMITER).unwrap_or(("", prefix));
        let parent = folder.sub_folder(dir);
        let (objects, _) = parent.list_folder().await?;
        if let Some(object) = objects.into_iter().find(|o| o.name == file) {
            return Ok(vec![prefixed(object, dir)]);
        }
    }

    let sub = folder.sub_folder(prefix);
    let objects = list_folder_recursively(sub.as_ref()).await?;
    Ok(objects
        .into_iter()
        .map(|object| prefixed(object, prefix))
        .collect())
}

fn prefixed(object: Object, prefix: &str) -> Object {
    Object {
        name: join_path(prefix, &object.name),
        ..object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryStorage;
    use crate::domain::ports::Storage;
    use crate::multistorage::test_support::RecordingCollector;
    use crate::multistorage::MultiFolder;
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn multi_folder(paths: &[&str]) -> MultiFolder {
        let storage = MemoryStorage::new("test");
        let roots = HashMap::from([("test_storage".to_string(), storage.root_folder())]);
        let collector = Arc::new(RecordingCollector::new(&["test_storage"], &["test_storage"]));
        let folder = MultiFolder::new(roots, collector)
            .use_all_alive_storages()
            .await
            .unwrap();
        for path in paths {
            folder.put_object(path, Bytes::new()).await.unwrap();
        }
        folder
    }

    fn sorted_names(objects: &[Object]) -> Vec<String> {
        for object in objects {
            assert_eq!(object.storage_name(), "test_storage");
        }
        let mut names: Vec<String> = objects.iter().map(|o| o.name.clone()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_list_recursively() {
        let paths = [
            "a",
            "subfolder1/b",
            "subfolder1/subfolder11/c",
            "subfolder2/d",
        ];
        let folder = multi_folder(&paths).await;

        let objects = list_folder_recursively(&folder).await.unwrap();
        assert_eq!(sorted_names(&objects), paths.to_vec());
    }

    #[tokio::test]
    async fn test_list_recursively_with_filter() {
        let included = [
            "basebackups_005/base_123312",
            "basebackups_005/base_123_backup_stop_sentinel.json",
            "basebackups_005/base_321/nop",
            "basebackups_005/base_456/some_folder/2",
            "basebackups_005/base_456/tar_partitions",
            "basebackups_005/base_456/tar_partitions_file",
            "basebackups_005/base_456_backup_stop_sentinel.json",
            "basebackups_005/folder123/nop",
        ];
        let excluded = [
            "basebackups_005/base_456/tar_partitions/1",
            "basebackups_005/base_456/tar_partitions/2",
            "basebackups_005/base_456/tar_partitions/3",
            "basebackups_005/base_456/tar_partitions/1/1",
        ];
        let folder = multi_folder(&[&included[..], &excluded[..]].concat()).await;

        let objects = list_folder_recursively_with_filter(&folder, |path| {
            !path.starts_with("basebackups_005/base_456/tar_partitions")
        })
        .await
        .unwrap();

        let mut expected = included.to_vec();
        expected.sort();
        assert_eq!(sorted_names(&objects), expected);
    }

    #[tokio::test]
    async fn test_prefix_naming_a_file() {
        let folder = multi_folder(&["a/b/c/123", "a/b/c/123/waste1", "a/b/c/123/waste2/waste3"]).await;
        let objects = list_folder_recursively_with_prefix(&folder, "a/b/c/123")
            .await
            .unwrap();
        assert_eq!(sorted_names(&objects), vec!["a/b/c/123"]);

        folder.put_object("a", Bytes::new()).await.unwrap();
        for prefix in ["a", "/a"] {
            let objects = list_folder_recursively_with_prefix(&folder, prefix)
                .await
                .unwrap();
            assert_eq!(sorted_names(&objects), vec!["a"]);
        }
    }

    #[tokio::test]
    async fn test_prefix_naming_a_folder() {
        let folder = multi_folder(&["waste1", "a/111", "a/b/222", "a/b/c/333", "b/waste2"]).await;
        for prefix in ["a", "a/", "/a", "/a/"] {
            let objects = list_folder_recursively_with_prefix(&folder, prefix)
                .await
                .unwrap();
            assert_eq!(sorted_names(&objects), vec!["a/111", "a/b/222", "a/b/c/333"]);
        }
    }

    #[tokio::test]
    async fn test_empty_prefix_lists_everything() {
        let folder = multi_folder(&["000", "a/111", "a/b/222", "b/333"]).await;
        for prefix in ["", "/"] {
            let objects = list_folder_recursively_with_prefix(&folder, prefix)
                .await
                .unwrap();
            assert_eq!(sorted_names(&objects), vec!["000", "a/111", "a/b/222", "b/333"]);
        }
    }

    #[tokio::test]
    async fn test_missing_prefix_is_empty() {
        let folder = multi_folder(&["a/111"]).await;
        let objects = list_folder_recursively_with_prefix(&folder, "zzz")
            .await
            .unwrap();
        assert!(objects.is_empty());
    }
}
