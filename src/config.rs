//! Loads the site configuration from a `scriptorium.yaml` project file. Every
//! field is optional:
//!
//! ```yaml
//! blog_title: Field Notes
//! blog_subtitle: Things I wrote down
//! style: /css/style.css
//! root_url: https://example.org
//! disqus_shortname: fieldnotes
//! google_analytics_id: UA-0000000-1
//! template: default.html
//! converter: [smu]
//! ```

use crate::util::open;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "scriptorium.yaml";

/// The directory (under the source directory) that holds page templates. It
/// is never rendered or copied.
pub const TEMPLATES_DIRECTORY: &str = "templates";

#[derive(Deserialize)]
#[serde(default)]
struct Project {
    blog_title: String,
    blog_subtitle: String,
    style: String,
    syntax_color: String,
    root_url: Option<Url>,
    disqus_shortname: String,
    google_analytics_id: String,
    template: String,
    markdown_extension: String,
    host: String,
    port: u16,
    converter: Option<Vec<String>>,
    source: PathBuf,
    output: PathBuf,
}

impl Default for Project {
    fn default() -> Self {
        let site = Site::default();
        Project {
            blog_title: site.blog_title,
            blog_subtitle: site.blog_subtitle,
            style: site.style,
            syntax_color: site.syntax_color,
            root_url: site.root_url,
            disqus_shortname: site.disqus_shortname,
            google_analytics_id: site.google_analytics_id,
            template: String::from("default.html"),
            markdown_extension: String::from(".md"),
            host: site.host,
            port: site.port,
            converter: None,
            source: PathBuf::from("site"),
            output: PathBuf::from("www"),
        }
    }
}

/// The site-wide values exposed to documents through the built-in macros.
#[derive(Clone, Debug)]
pub struct Site {
    pub blog_title: String,
    pub blog_subtitle: String,
    pub style: String,
    pub syntax_color: String,

    /// The public root of the site. Comment widgets link back to pages under
    /// this URL; without it they point at the local preview server.
    pub root_url: Option<Url>,

    pub disqus_shortname: String,
    pub google_analytics_id: String,

    /// The address of the local preview server.
    pub host: String,
    pub port: u16,
}

impl Default for Site {
    fn default() -> Self {
        Site {
            blog_title: String::new(),
            blog_subtitle: String::new(),
            style: String::new(),
            syntax_color: String::new(),
            root_url: None,
            disqus_shortname: String::new(),
            google_analytics_id: String::new(),
            host: String::from("0.0.0.0"),
            port: 8000,
        }
    }
}

pub struct Config {
    pub site: Site,

    /// The directory holding the documents and assets to build.
    pub source_directory: PathBuf,

    /// The directory the site is built into. It is deleted before each build.
    pub output_directory: PathBuf,

    /// The template every rendered document is wrapped in.
    pub template_file: PathBuf,

    /// The extension (including the dot) that marks a file as a document.
    pub markdown_extension: String,

    /// An external command (program and arguments) that converts document
    /// bodies to HTML. `None` selects the built-in Markdown converter.
    pub converter: Option<Vec<String>>,
}

impl Config {
    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .map_err(|e| anyhow!("Loading configuration: {:?}", e))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file. Relative `source` and `output` directories are
    /// resolved against the project file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(project_root, project)),
        }
    }

    fn from_project(project_root: &Path, project: Project) -> Config {
        let source_directory = project_root.join(&project.source);
        Config {
            template_file: source_directory
                .join(TEMPLATES_DIRECTORY)
                .join(&project.template),
            output_directory: project_root.join(&project.output),
            source_directory,
            markdown_extension: project.markdown_extension,
            converter: project.converter,
            site: Site {
                blog_title: project.blog_title,
                blog_subtitle: project.blog_subtitle,
                style: project.style,
                syntax_color: project.syntax_color,
                root_url: project.root_url,
                disqus_shortname: project.disqus_shortname,
                google_analytics_id: project.google_analytics_id,
                host: project.host,
                port: project.port,
            },
        }
    }

    /// Replaces the source directory (e.g. from the command line), keeping the
    /// template file name.
    pub fn set_source_directory(&mut self, source_directory: PathBuf) {
        if let Some(template) = self.template_file.file_name() {
            self.template_file = source_directory.join(TEMPLATES_DIRECTORY).join(template);
        }
        self.source_directory = source_directory;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "blog_title: Field Notes\nroot_url: https://example.org/\nport: 9000\n",
        )?;
        let nested = root.path().join("site").join("posts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!("Field Notes", config.site.blog_title);
        assert_eq!(9000, config.site.port);
        assert_eq!("0.0.0.0", config.site.host);
        assert_eq!(
            Some("https://example.org/"),
            config.site.root_url.as_ref().map(Url::as_str)
        );
        assert_eq!(root.path().join("site"), config.source_directory);
        assert_eq!(root.path().join("www"), config.output_directory);
        assert_eq!(
            root.path().join("site/templates/default.html"),
            config.template_file
        );
        assert_eq!(".md", config.markdown_extension);
        assert!(config.converter.is_none());
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(
            &path,
            "template: blog.html\nsource: content\noutput: public\nconverter: [smu, --safe]\n",
        )?;

        let mut config = Config::from_project_file(&path)?;
        assert_eq!(root.path().join("content/templates/blog.html"), config.template_file);
        assert_eq!(root.path().join("public"), config.output_directory);
        assert_eq!(
            Some(vec!["smu".to_owned(), "--safe".to_owned()]),
            config.converter
        );

        config.set_source_directory(PathBuf::from("/elsewhere"));
        assert_eq!(PathBuf::from("/elsewhere/templates/blog.html"), config.template_file);
        Ok(())
    }

    #[test]
    fn test_invalid_project_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "port: not-a-number\n")?;
        assert!(Config::from_project_file(&path).is_err());
        Ok(())
    }
}
