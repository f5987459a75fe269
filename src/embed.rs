//! HTML snippet generators behind the embed, analytics, and comment-widget
//! macros in [`crate::builtins`].

/// Options for [`youtube`].
#[derive(Clone, Debug)]
pub struct YouTube {
    pub width: i64,
    pub height: i64,
    /// Show related videos when playback ends.
    pub related: bool,
    pub ssl: bool,
    /// Use the regular domain rather than `youtube-nocookie.com`.
    pub cookie: bool,
}

impl Default for YouTube {
    fn default() -> Self {
        YouTube {
            width: 560,
            height: 315,
            related: true,
            ssl: false,
            cookie: true,
        }
    }
}

/// An `<iframe>` embedding a YouTube video.
pub fn youtube(id: &str, options: &YouTube) -> String {
    let protocol = if options.ssl { "https://" } else { "http://" };
    let domain = if options.cookie {
        "www.youtube.com/embed/"
    } else {
        "www.youtube-nocookie.com/embed/"
    };
    let related = if options.related { "" } else { "?rel=0" };
    iframe(
        options.width,
        options.height,
        &format!("{}{}{}{}", protocol, domain, id, related),
    )
}

/// Options for [`vimeo`].
#[derive(Clone, Debug)]
pub struct Vimeo {
    pub width: i64,
    pub height: i64,
    pub autoplay: bool,
    /// Show the uploader's portrait.
    pub avatar: bool,
    pub title: bool,
    /// Show the uploader's byline.
    pub author: bool,
    /// Player accent color, with or without a leading `#`.
    pub color: Option<String>,
}

impl Default for Vimeo {
    fn default() -> Self {
        Vimeo {
            width: 560,
            height: 315,
            autoplay: false,
            avatar: false,
            title: true,
            author: false,
            color: None,
        }
    }
}

/// An `<iframe>` embedding a Vimeo video.
pub fn vimeo(id: &str, options: &Vimeo) -> String {
    let mut src = format!("http://player.vimeo.com/video/{}", id);
    src.push_str(if options.autoplay { "?autoplay=1" } else { "?" });
    if !options.avatar {
        src.push_str("portrait=0&");
    }
    if !options.title {
        src.push_str("title=0&");
    }
    if !options.author {
        src.push_str("byline=0");
    }
    if let Some(color) = &options.color {
        src.push_str("color=");
        src.push_str(&color.replace('#', ""));
    }
    iframe(options.width, options.height, &src)
}

fn iframe(width: i64, height: i64, src: &str) -> String {
    format!(
        r#"<iframe width="{}" height="{}" src="{}" frameborder="0" allowfullscreen></iframe>"#,
        width, height, src
    )
}

/// A `<script>` embedding a GitHub gist, optionally a single file of it.
pub fn gist(id: &str, filename: Option<&str>) -> String {
    match filename {
        Some(filename) => format!(
            r#"<script src="https://gist.github.com/{}.js?file={}"></script>"#,
            id, filename
        ),
        None => format!(r#"<script src="https://gist.github.com/{}.js"></script>"#, id),
    }
}

/// The URL of an image rendering `latex`.
pub fn latex_math(latex: &str) -> String {
    format!("https://chart.googleapis.com/chart?cht=tx&chl={}", latex)
}

/// A `mailto:` link hidden from scrapers: the anchor is ROT13-encoded and
/// decoded by a script in the browser.
pub fn email(address: &str, display_name: Option<&str>) -> String {
    obfuscated_text(&format!(
        r#"<a href="mailto:{}">{}</a>"#,
        address,
        display_name.unwrap_or(address)
    ))
}

/// Wraps `text` in a script that writes it out after undoing [`rot13`].
pub fn obfuscated_text(text: &str) -> String {
    format!(
        r#"<noscript>(Javascript must be enabled to see this e-mail address)</noscript>
              <script type="text/javascript">
              document.write(
              "{}".replace(/[a-zA-Z]/g,
              function(c){{
                return String.fromCharCode(
                (c<="Z"?90:122)>=(c=c.charCodeAt(0)+13)?c:c-26);}}));
            </script>"#,
        rot13(text)
    )
}

/// ROT13-encodes `text` and escapes it for a double-quoted JavaScript string
/// literal. `@`, `.` and `/` are written as octal escapes so the output never
/// looks like an address or URL.
pub fn rot13(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'a'..='z' => encoded.push((b'a' + (c as u8 - b'a' + 13) % 26) as char),
            'A'..='Z' => encoded.push((b'A' + (c as u8 - b'A' + 13) % 26) as char),
            '\\' => encoded.push_str(r"\\"),
            '"' => encoded.push_str(r#"\""#),
            '\n' => encoded.push_str(r"\n"),
            '@' => encoded.push_str(r"\100"),
            '.' => encoded.push_str(r"\056"),
            '/' => encoded.push_str(r"\057"),
            c => encoded.push(c),
        }
    }
    encoded
}

/// The Google Analytics tracking snippet.
pub fn google_analytics(id: &str) -> String {
    format!(
        r#"<script type="text/javascript">
      var _gaq = _gaq || [];
      _gaq.push(['_setAccount', '{}']);
      _gaq.push(['_trackPageview']);

      (function() {{
        var ga = document.createElement('script'); ga.type = 'text/javascript'; ga.async = true;
        ga.src = ('https:' == document.location.protocol ? 'https://ssl' : 'http://www') + '.google-analytics.com/ga.js';
        var s = document.getElementsByTagName('script')[0]; s.parentNode.insertBefore(ga, s);
      }})();
    </script>"#,
        id
    )
}

/// Where a page is served from, for comment threads.
#[derive(Clone, Debug)]
pub struct Origin<'a> {
    /// The public root URL; empty when the site has none.
    pub host: &'a str,
    /// The local preview server's address, used when `host` is empty.
    pub preview_host: &'a str,
    pub preview_port: u16,
}

impl Origin<'_> {
    /// The absolute URL of the page at `path`.
    pub fn page_url(&self, path: &str) -> String {
        if self.host.is_empty() {
            format!(
                "http://{}:{}{}",
                self.preview_host.replace("0.0.0.0", "127.0.0.1"),
                self.preview_port,
                path
            )
        } else if path.starts_with('/') {
            format!("{}{}", self.host.trim_end_matches('/'), path)
        } else {
            format!("{}{}", self.host, path)
        }
    }
}

/// The Disqus comment thread for the page at `path`. The title is escaped for
/// a single-quoted JavaScript string.
pub fn disqus(shortname: &str, path: &str, origin: &Origin, title: &str) -> String {
    let url = origin.page_url(path);
    format!(
        r#"<div id="disqus_thread"></div>
    <script type="text/javascript">
        var disqus_shortname = '{}';
        var disqus_identifier = '{}';
        var disqus_url = '{}';
        var disqus_title = '{}';

        (function() {{
            var dsq = document.createElement('script'); dsq.type = 'text/javascript'; dsq.async = true;
            dsq.src = '//' + disqus_shortname + '.disqus.com/embed.js';
            (document.getElementsByTagName('head')[0] || document.getElementsByTagName('body')[0]).appendChild(dsq);
        }})();
    </script>
    <noscript>Please enable JavaScript to view the <a href="http://disqus.com/?ref_noscript">comments powered by Disqus.</a></noscript>"#,
        shortname,
        url,
        url,
        title.replace('\\', r"\\").replace('\'', r"\'")
    )
}

/// The Disqus script that fills in `#disqus_thread` comment-count links.
pub fn disqus_comment_count(shortname: &str) -> String {
    format!(
        r#"<script type="text/javascript">
      var disqus_shortname = '{}';
      (function () {{
        var s = document.createElement('script'); s.async = true;
        s.type = 'text/javascript';
        s.src = 'http://' + disqus_shortname + '.disqus.com/count.js';
        (document.getElementsByTagName('HEAD')[0] || document.getElementsByTagName('BODY')[0]).appendChild(s);
      }}());
    </script>
    <noscript>Please enable JavaScript to view the <a href="http://disqus.com/?ref_noscript">comments powered by Disqus.</a></noscript>"#,
        shortname
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_youtube() {
        assert_eq!(
            r#"<iframe width="400" height="315" src="http://www.youtube.com/embed/abc123" frameborder="0" allowfullscreen></iframe>"#,
            youtube(
                "abc123",
                &YouTube {
                    width: 400,
                    ..YouTube::default()
                }
            )
        );
        let private = youtube(
            "abc123",
            &YouTube {
                related: false,
                ssl: true,
                cookie: false,
                ..YouTube::default()
            },
        );
        assert!(private.contains(r#"src="https://www.youtube-nocookie.com/embed/abc123?rel=0""#));
    }

    #[test]
    fn test_vimeo() {
        assert!(vimeo("42", &Vimeo::default())
            .contains(r#"src="http://player.vimeo.com/video/42?portrait=0&byline=0""#));
        let all = vimeo(
            "42",
            &Vimeo {
                autoplay: true,
                avatar: true,
                title: false,
                author: true,
                color: Some("#ff0000".to_owned()),
                ..Vimeo::default()
            },
        );
        assert!(all.contains(
            r#"src="http://player.vimeo.com/video/42?autoplay=1title=0&color=ff0000""#
        ));
    }

    #[test]
    fn test_gist() {
        assert_eq!(
            r#"<script src="https://gist.github.com/123.js?file=main.rs"></script>"#,
            gist("123", Some("main.rs"))
        );
        assert_eq!(
            r#"<script src="https://gist.github.com/123.js"></script>"#,
            gist("123", None)
        );
    }

    #[test]
    fn test_rot13() {
        assert_eq!("Uryyb", rot13("Hello"));
        assert_eq!(r#"n\100o\056p\057\"q\"\\\n"#, rot13("a@b.c/\"d\"\\\n"));
    }

    #[test]
    fn test_email_hides_the_address() {
        let html = email("me@example.org", None);
        assert!(!html.contains("me@example.org"));
        assert!(html.contains(r"zr\100rknzcyr\056bet"));
    }

    #[test]
    fn test_page_url() {
        let preview = Origin {
            host: "",
            preview_host: "0.0.0.0",
            preview_port: 8000,
        };
        assert_eq!("http://127.0.0.1:8000/posts/a.html", preview.page_url("/posts/a.html"));

        let public = Origin {
            host: "https://example.org/",
            preview_host: "0.0.0.0",
            preview_port: 8000,
        };
        assert_eq!("https://example.org/posts/a.html", public.page_url("/posts/a.html"));
    }

    #[test]
    fn test_disqus_escapes_title() {
        let origin = Origin {
            host: "https://example.org",
            preview_host: "0.0.0.0",
            preview_port: 8000,
        };
        let html = disqus("notes", "/a.html", &origin, "Don't panic");
        assert!(html.contains("var disqus_url = 'https://example.org/a.html';"));
        assert!(html.contains(r"var disqus_title = 'Don\'t panic';"));

        let html = disqus("notes", "/a.html", &origin, r"C:\ isn't\");
        assert!(html.contains(r"var disqus_title = 'C:\\ isn\'t\\';"));
    }
}
