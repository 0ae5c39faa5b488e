//! Album/image consistency across mixed operation sequences.

mod common;

use std::collections::HashMap;

use common::TestHarness;
use picfolio_common::{AlbumId, ImageId};
use picfolio_db::queries::{albums, images};

/// Every image points at an existing album and every cover at an image of
/// its own album.
fn assert_consistent(h: &TestHarness) {
    let conn = h.conn();
    let all_albums = albums::get_all_albums(&conn).unwrap();
    let all_images = images::get_all_images(&conn).unwrap();

    let owner: HashMap<ImageId, AlbumId> = all_images.iter().map(|i| (i.id, i.album_id)).collect();

    for image in &all_images {
        assert!(
            all_albums.iter().any(|a| a.id == image.album_id),
            "image {} points at missing album {}",
            image.id,
            image.album_id
        );
    }
    for album in &all_albums {
        if let Some(cover) = album.cover_photo_id {
            assert_eq!(
                owner.get(&cover),
                Some(&album.id),
                "album {} has foreign or dangling cover {}",
                album.id,
                cover
            );
        }
        let has_images = all_images.iter().any(|i| i.album_id == album.id);
        if has_images {
            assert!(album.cover_photo_id.is_some(), "album {} lost its cover", album.id);
        }
    }
}

#[tokio::test]
async fn mixed_operations_stay_consistent() {
    let h = TestHarness::new();
    let a = h.create_album("A");
    let b = h.create_album("B");
    assert_consistent(&h);

    let a1 = h.upload_jpeg(a.id, "a1.jpg", 20, 10).await;
    let a2 = h.upload_jpeg(a.id, "a2.jpg", 20, 10).await;
    let b1 = h.upload_jpeg(b.id, "b1.jpg", 20, 10).await;
    assert_consistent(&h);

    h.library.albums().set_album_cover_photo(a.id, a2).unwrap();
    assert!(h.library.albums().set_album_cover_photo(a.id, b1).is_err());
    assert_consistent(&h);

    h.library.images().rotate_image(a1).await.unwrap();
    h.library.images().delete_image(a2).unwrap();
    assert_eq!(h.cover_of(a.id), Some(a1));
    assert_consistent(&h);

    let c = h.create_album("C");
    let c1 = h.upload_jpeg(c.id, "c1.jpg", 20, 10).await;
    h.library.images().delete_image(c1).unwrap();
    assert_consistent(&h);

    h.library.albums().delete_album(b.id).unwrap();
    assert_consistent(&h);

    h.library.images().delete_image(a1).unwrap();
    h.library.albums().delete_album(a.id).unwrap();
    h.library.albums().delete_album(c.id).unwrap();
    assert_consistent(&h);

    h.settle().await;
    assert!(h.library.albums().get_all_albums().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_uploads_elect_one_cover() {
    let h = TestHarness::on_disk();
    let album = h.create_album("Race");
    let album_id = album.id;

    let mut tasks = Vec::new();
    for i in 0..6 {
        let images = h.library.images().clone();
        let bytes = common::jpeg(24, 16);
        tasks.push(tokio::spawn(async move {
            images.upload(album_id, bytes, &format!("{}.jpg", i)).await
        }));
    }

    let mut uploaded = Vec::new();
    for task in tasks {
        uploaded.push(task.await.unwrap().unwrap());
    }

    let cover = h.cover_of(album.id).expect("cover must be set");
    assert!(uploaded.contains(&cover));
    assert_eq!(h.images_of(album.id).len(), 6);
    assert_consistent(&h);
}
