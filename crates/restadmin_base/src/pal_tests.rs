/* 📖 # PAL parity test suite

The engine is tested almost exclusively against MockPal, and the CLI runs on RealPal.
These tests run the same scenario against both implementations so the two stay
behaviorally aligned: writes create parent directories, walks match globs relative
to the walked directory, and recursive removal drops everything below a directory.
*/

#[cfg(test)]
mod parity_tests {
    use crate::pal::{FilePath, MockPal, Pal, PalHandle, RealPal};

    fn module_scenario(pal: &PalHandle) -> Vec<FilePath> {
        pal.write_file(
            &FilePath::from("module/BarConf/config/module.config.json"),
            b"{}\n",
        )
        .unwrap();
        pal.write_file(
            &FilePath::from("module/BarConf/src/BarConf/Rest/Barbaz/BarbazEntity.php"),
            b"entity",
        )
        .unwrap();
        pal.write_file(
            &FilePath::from("module/FooConf/config/module.config.yaml"),
            b"{}\n",
        )
        .unwrap();

        pal.remove_directory_all(&FilePath::from("module/BarConf/src/BarConf/Rest/Barbaz"))
            .unwrap();

        let globs = vec![
            "*/config/module.config.json".to_string(),
            "*/config/module.config.yaml".to_string(),
            "**/*.php".to_string(),
        ];
        let mut found = pal
            .walk_directory(&FilePath::from("module"), &globs)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        found.sort();
        found
    }

    #[test]
    fn test_mock_and_real_pal_agree() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let real = PalHandle::new(RealPal::new(temp_dir.path().to_path_buf()));
        let mock = PalHandle::new(MockPal::new());

        let expected = vec![
            FilePath::from("module/BarConf/config/module.config.json"),
            FilePath::from("module/FooConf/config/module.config.yaml"),
        ];
        assert_eq!(module_scenario(&real), expected);
        assert_eq!(module_scenario(&mock), expected);
    }

    #[test]
    fn test_read_file_to_string_invalid_utf8() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("bad.txt"), vec![0xFF, 0xFE]);

        let result = mock.read_file_to_string(&FilePath::from("bad.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let mock = MockPal::new();
        let err = mock
            .read_file_to_string(&FilePath::from("module/X/config/module.config.json"))
            .unwrap_err();
        assert!(err.to_string().contains("module/X/config/module.config.json"));
    }

    #[test]
    fn test_pal_trait_object() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from("test.txt"), b"content".to_vec());

        let pal: Box<dyn Pal> = Box::new(mock);
        assert!(pal.file_exists(&FilePath::from("test.txt")).unwrap());
    }
}
