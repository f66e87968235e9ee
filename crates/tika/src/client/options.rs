use std::fmt;

/// A Tika translator, named by the Java class the server should load.
///
/// The built-in translators need their credentials (API keys and so on)
/// configured in Tika Server itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translator {
    Lingo24,
    Google,
    Moses,
    Joshua,
    Microsoft,
    Yandex,
    /// Any other translator class available to the server.
    Custom(String),
}

impl Translator {
    pub fn class_name(&self) -> &str {
        match self {
            Translator::Lingo24 => "org.apache.tika.language.translate.Lingo24Translator",
            Translator::Google => "org.apache.tika.language.translate.GoogleTranslator",
            Translator::Moses => "org.apache.tika.language.translate.MosesTranslator",
            Translator::Joshua => "org.apache.tika.language.translate.JoshuaTranslator",
            Translator::Microsoft => "org.apache.tika.language.translate.MicrosoftTranslator",
            Translator::Yandex => "org.apache.tika.language.translate.YandexTranslator",
            Translator::Custom(class) => class,
        }
    }
}

impl fmt::Display for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Form of the `X-TIKA:content` field in recursive metadata responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecursiveContentType {
    /// XHTML as produced by the parser (server default).
    Xml,
    /// Plain text.
    #[default]
    Text,
    Html,
    /// Metadata only, content is left empty.
    Ignore,
}

impl RecursiveContentType {
    pub(crate) fn path(self) -> &'static str {
        match self {
            RecursiveContentType::Xml => "/rmeta",
            RecursiveContentType::Text => "/rmeta/text",
            RecursiveContentType::Html => "/rmeta/html",
            RecursiveContentType::Ignore => "/rmeta/ignore",
        }
    }
}
