// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2

/// A synthetic page: block text and the matching target markup.
#[allow(dead_code)]
pub struct Page {
    pub mdx: String,
    pub xhtml: String,
}

#[allow(dead_code)]
pub fn generate_page(sections: usize) -> Page {
    let mut mdx = String::new();
    let mut xhtml = String::new();

    for s in 0..sections {
        mdx.push_str(&format!("## Section {s}\n\n"));
        xhtml.push_str(&format!("<h1>Section {s}</h1>\n"));

        mdx.push_str(&format!(
            "Paragraph {s} with **bold** text and a [link](https://example.com/{s}).\n\n"
        ));
        xhtml.push_str(&format!(
            "<p>Paragraph {s} with <strong>bold</strong> text and a <a href=\"https://example.com/{s}\">link</a>.</p>\n"
        ));

        mdx.push_str("- first item\n- second item\n- third item\n\n");
        xhtml.push_str(
            "<ul><li><p>first item</p></li><li><p>second item</p></li><li><p>third item</p></li></ul>\n",
        );

        if s % 3 == 0 {
            mdx.push_str(&format!(
                "<Callout type=\"info\">\nNote {s} body.\n\nSecond note line.\n</Callout>\n\n"
            ));
            xhtml.push_str(&format!(
                "<ac:structured-macro ac:name=\"info\"><ac:rich-text-body><p>Note {s} body.</p><p>Second note line.</p></ac:rich-text-body></ac:structured-macro>\n"
            ));
        }
    }

    Page { mdx, xhtml }
}

/// Rewrites every fifth paragraph and the second list item of every section.
#[allow(dead_code)]
pub fn edit_page(mdx: &str) -> String {
    mdx.lines()
        .map(|line| {
            if line.starts_with("Paragraph ") && line.contains('5') {
                line.replace("bold", "strong")
            } else if line == "- second item" {
                "- second item, revised".to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}
