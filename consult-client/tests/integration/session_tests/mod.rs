pub mod test_local_media;
