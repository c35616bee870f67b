//! Unit tests for resource loaders.

use std::fs;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

#[fixture]
fn view_dir() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    let class_dir = dir.path().join("shop").join("Cart");
    fs::create_dir_all(&class_dir).expect("create class dir");
    fs::write(class_dir.join("index.tpl"), "cart ${it.count}").expect("write view");
    dir
}

fn loader_for(dir: &TempDir) -> DirectoryLoader {
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
    DirectoryLoader::new(root)
}

#[rstest]
fn directory_loader_finds_existing_file(view_dir: TempDir) {
    let loader = loader_for(&view_dir);
    let resource = loader
        .find("shop/Cart/index.tpl")
        .expect("lookup")
        .expect("resource exists");
    assert_eq!(resource.path(), "shop/Cart/index.tpl");
    assert_eq!(resource.read_to_string().expect("read"), "cart ${it.count}");
}

#[rstest]
fn directory_loader_reports_missing_file_as_absent(view_dir: TempDir) {
    let loader = loader_for(&view_dir);
    assert!(loader.find("shop/Cart/missing.tpl").expect("lookup").is_none());
}

#[rstest]
fn directory_loader_ignores_directories(view_dir: TempDir) {
    let loader = loader_for(&view_dir);
    assert!(loader.find("shop/Cart").expect("lookup").is_none());
}

#[rstest]
#[case("../outside.tpl")]
#[case("shop/../../outside.tpl")]
#[case("/etc/passwd")]
fn directory_loader_refuses_to_escape_root(view_dir: TempDir, #[case] path: &str) {
    let loader = loader_for(&view_dir);
    assert!(loader.find(path).expect("lookup").is_none());
}

#[test]
fn directory_loader_reads_root_from_config() {
    let config = trellis_config::Config::default();
    let loader = DirectoryLoader::from_config(&config);
    assert_eq!(loader.root(), config.view_root());
}

#[test]
fn memory_loader_serves_inserted_content() {
    let loader = MemoryLoader::new().with("shop/Cart/index.txt", "plain");
    let resource = loader
        .find("shop/Cart/index.txt")
        .expect("lookup")
        .expect("present");
    assert_eq!(resource.read_to_string().expect("read"), "plain");
    assert!(loader.find("shop/Cart/other.txt").expect("lookup").is_none());
}

#[rstest]
#[case("shop/Cart/index.tpl", Some(".tpl"))]
#[case("shop/Cart/index", None)]
#[case("shop.v2/Cart/index", None)]
#[case("a/b/c.d.txt", Some(".txt"))]
fn extension_comes_from_final_segment(#[case] path: &str, #[case] expected: Option<&str>) {
    let resource = Resource::memory(path, "");
    assert_eq!(resource.extension(), expected);
}
