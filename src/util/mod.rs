pub mod extract_css_urls;
