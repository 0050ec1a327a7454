// Web-Modul: eingebettete statische Assets
// Die Dateien werden zur Compile-Zeit direkt ins Binary eingebettet

/// Steuer-UI für den Betriebsmodus (enthält den %STATE%-Platzhalter)
pub const INDEX_HTML: &str = include_str!("index.html");

/// Provisioning-Formular für den AP-Modus
pub const WIFIMANAGER_HTML: &str = include_str!("wifimanager.html");

/// Gemeinsames Stylesheet beider Modi
pub const STYLE_CSS: &str = include_str!("style.css");
