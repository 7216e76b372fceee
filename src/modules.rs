use std::fs;
use std::path::Path;
use tracing::debug;

/// One scaffoldable fixture module: an identifier you can pass to
/// `--include`, the path it lands at under the repo root, and the literal
/// file body. The bodies are fixtures for an external PR-review tool's
/// end-to-end tests and must stay byte-identical across runs.
#[derive(Debug)]
pub struct Module {
    pub name: &'static str,
    pub path: &'static str,
    pub body: &'static str,
}

pub static MODULES: &[Module] = &[
    Module {
        name: "string_utils",
        path: "utils/string_utils.py",
        body: r#"def capitalize_first_letter(string):
    """
    Capitalize the first letter of a string
    If string is None, return empty string
    Otherwise, return the string with the first letter capitalized
    """
    return string[0].upper() + string[1:]

"#,
    },
    Module {
        name: "post_service",
        path: "utils/posts_service.py",
        body: r#"import requests

BASE_URL = "https://jsonplaceholder.typicode.com"
REQUEST_TIMEOUT_SECONDS = 5


def get_post_with_comments(post_id):
    """
    Fetch a post and its comments from the JSONPlaceholder API
    Returns a (post, comments) tuple of decoded JSON bodies
    """
    post = requests.get(f"{BASE_URL}/posts/{post_id}", timeout=REQUEST_TIMEOUT_SECONDS)
    post.raise_for_status()
    comments = requests.get(
        f"{BASE_URL}/posts/{post_id}/comments", timeout=REQUEST_TIMEOUT_SECONDS
    )
    comments.raise_for_status()
    return post.json(), comments.json()


def format_post_header(post):
    """
    Format a post into a one-line header of its id and title
    """
    return f"[{post['id']}] {post['title']}"
"#,
    },
];

/// Splits an `--include` value into module names.
/// Surrounding whitespace is dropped, as are empty segments.
pub fn parse_include(include: &str) -> Vec<String> {
    include
        .split(',')
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| name.to_owned())
        .collect()
}

/// Resolves the selected names against the module table.
/// An empty selection and an unknown name are both errors; nothing has been
/// touched yet when either is reported.
pub fn validate_selection(names: &[String]) -> anyhow::Result<Vec<&'static Module>> {
    if names.is_empty() {
        anyhow::bail!(
            "No modules selected. Pass --include with at least one of: {}.",
            valid_names().join(", "),
        );
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let Some(module) = MODULES.iter().find(|module| module.name == name) else {
            anyhow::bail!(
                "Unknown module `{name}`. Valid modules: {}.",
                valid_names().join(", "),
            );
        };
        selected.push(module);
    }
    Ok(selected)
}

/// Writes each selected module's body to its destination under `repo_root`,
/// creating parent directories as needed. Existing files are overwritten.
pub fn materialize(repo_root: &Path, selected: &[&Module]) -> anyhow::Result<()> {
    for module in selected {
        let destination = repo_root.join(module.path);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(module = module.name, path = module.path, "writing fixture module");
        fs::write(&destination, module.body)?;
        println!("Wrote {}.", module.path);
    }
    Ok(())
}

fn valid_names() -> Vec<&'static str> {
    MODULES.iter().map(|module| module.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_parse_include_splits_and_trims() {
        assert_eq!(
            parse_include("string_utils, post_service"),
            vec!["string_utils".to_owned(), "post_service".to_owned()],
        );
    }

    #[test]
    fn test_parse_include_drops_empty_segments() {
        assert_eq!(parse_include(""), Vec::<String>::new());
        assert_eq!(parse_include(",,"), Vec::<String>::new());
        assert_eq!(parse_include("string_utils,"), vec!["string_utils".to_owned()]);
    }

    #[test]
    fn test_validate_selection_rejects_empty() {
        let error = validate_selection(&[]).unwrap_err();
        assert!(error.to_string().contains("No modules selected"));
        assert!(error.to_string().contains("string_utils"));
    }

    #[test]
    fn test_validate_selection_names_the_offender() {
        let error = validate_selection(&["bogus_module".to_owned()]).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("bogus_module"));
        assert!(message.contains("string_utils"));
        assert!(message.contains("post_service"));
    }

    #[test]
    fn test_validate_selection_resolves_known_names() -> anyhow::Result<()> {
        let selected =
            validate_selection(&["post_service".to_owned(), "string_utils".to_owned()])?;
        let names: Vec<&str> = selected.iter().map(|module| module.name).collect();
        assert_eq!(names, vec!["post_service", "string_utils"]);
        Ok(())
    }

    #[test]
    fn test_materialize_writes_fixture_bodies() -> anyhow::Result<()> {
        let repo_root = TempDir::new("cobble")?;
        let selected = validate_selection(&["string_utils".to_owned()])?;
        materialize(repo_root.path(), &selected)?;

        let written = fs::read_to_string(repo_root.path().join("utils/string_utils.py"))?;
        assert_eq!(written, MODULES[0].body);
        assert!(written.starts_with("def capitalize_first_letter(string):"));
        Ok(())
    }

    #[test]
    fn test_materialize_writes_both_modules() -> anyhow::Result<()> {
        let repo_root = TempDir::new("cobble")?;
        let selected =
            validate_selection(&["string_utils".to_owned(), "post_service".to_owned()])?;
        materialize(repo_root.path(), &selected)?;

        assert!(repo_root.path().join("utils/string_utils.py").is_file());
        assert!(repo_root.path().join("utils/posts_service.py").is_file());
        Ok(())
    }

    #[test]
    fn test_materialize_overwrites_existing_files() -> anyhow::Result<()> {
        let repo_root = TempDir::new("cobble")?;
        fs::create_dir_all(repo_root.path().join("utils"))?;
        fs::write(repo_root.path().join("utils/string_utils.py"), "stale")?;

        let selected = validate_selection(&["string_utils".to_owned()])?;
        materialize(repo_root.path(), &selected)?;

        let written = fs::read_to_string(repo_root.path().join("utils/string_utils.py"))?;
        assert_eq!(written, MODULES[0].body);
        Ok(())
    }
}
