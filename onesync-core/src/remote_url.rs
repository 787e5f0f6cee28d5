/// Builds `base/folder/name` with exactly one `/` between the parts.
///
/// Trailing slashes on the base and any leading, trailing or repeated
/// slashes inside the folder and file name are dropped. An empty folder
/// contributes nothing, so the result never contains `//` after the scheme.
pub fn remote_file_url(base_url: &str, folder: &str, file_name: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    for part in [folder, file_name]
        .into_iter()
        .flat_map(|segment| segment.split('/'))
        .filter(|part| !part.is_empty())
    {
        url.push('/');
        url.push_str(part);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_slashes_in_every_combination() {
        let bases = ["https://host", "https://host/", "https://host//"];
        let folders = ["F", "/F", "F/", "/F/", "//F//"];
        let names = ["x.yaml", "/x.yaml"];
        for base in bases {
            for folder in folders {
                for name in names {
                    assert_eq!(
                        remote_file_url(base, folder, name),
                        "https://host/F/x.yaml",
                        "base={base:?} folder={folder:?} name={name:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn keeps_nested_folders() {
        assert_eq!(
            remote_file_url("https://webdav.yandex.ru/", "/Apps/Tabby/", "config.yaml"),
            "https://webdav.yandex.ru/Apps/Tabby/config.yaml"
        );
    }

    #[test]
    fn empty_folder_does_not_double_slash() {
        assert_eq!(
            remote_file_url("https://host/", "", "x.yaml"),
            "https://host/x.yaml"
        );
        assert_eq!(remote_file_url("https://host/", "/", "x.yaml"), "https://host/x.yaml");
    }

    #[test]
    fn base_with_path_is_preserved() {
        assert_eq!(
            remote_file_url("https://host/remote.php/dav/files/me/", "Tabby", "x.yaml"),
            "https://host/remote.php/dav/files/me/Tabby/x.yaml"
        );
    }
}
