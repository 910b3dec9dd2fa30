use crate::parsers::{DEFAULT_MARKER, extract_links};

#[cfg(test)]
mod tests {
    use super::*;

    const MANUALS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>User Manuals</title>
  <link rel="stylesheet" href="/cdn/theme.css">
  <script>window.__cf_chl_opt = {};</script>
</head>
<body>
  <header><nav><a href="/">Home</a> <a href="/pages/support">Support</a></nav></header>
  <main>
    <h1>User Manuals</h1>
    <table>
      <tr>
        <td>TX16S</td>
        <td><a href="https://cdn.example.com/files/TX16S_User_Manual.PDF?v=1697">Download</a></td>
      </tr>
      <tr>
        <td>Boxer</td>
        <td><a href=" //cdn.example.com/files/Boxer-Manual.pdf ">Download</a></td>
      </tr>
      <tr>
        <td>Pocket</td>
        <td><a href="/pages/pocket">Details</a></td>
      </tr>
    </table>
  </main>
  <footer><a href="https://cdn.example.com/files/Warranty.Pdf">Warranty</a></footer>
</body>
</html>"#;

    #[test]
    fn test_extract_from_rendered_page() {
        let links = extract_links(MANUALS_PAGE, DEFAULT_MARKER);
        assert_eq!(
            links,
            vec![
                "https://cdn.example.com/files/TX16S_User_Manual.PDF?v=1697",
                "//cdn.example.com/files/Boxer-Manual.pdf",
                "https://cdn.example.com/files/Warranty.Pdf",
            ]
        );
    }

    #[test]
    fn test_extract_from_failed_render() {
        assert!(extract_links("", DEFAULT_MARKER).is_empty());
    }

    #[test]
    fn test_extract_from_fragment() {
        let links = extract_links(r#"<a href="a.pdf">a</a> text <a href="b.txt">b</a>"#, ".pdf");
        assert_eq!(links, vec!["a.pdf"]);
    }
}
