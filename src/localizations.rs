use std::collections::HashMap;

const FALLBACK_LANG: &str = "en-US";

// Simple in-memory translations
#[derive(Default)]
pub struct Translations {
    strings: HashMap<&'static str, &'static str>,
}

impl Translations {
    fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            strings: pairs.iter().copied().collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&'static str> {
        self.strings.get(key).copied()
    }
}

const EN_US: &[(&str, &str)] = &[
    ("app-title", "Gallery-DL GUI"),
    ("tab-download", "Download"),
    ("tab-advanced", "Advanced"),
    ("tab-sites", "Supported Sites"),
    ("url-label", "Gallery URL:"),
    ("url-placeholder", "Paste a gallery, profile or post URL"),
    ("history-label", "Recent"),
    ("test-button", "Test URL"),
    ("download-button", "Download"),
    ("stop-button", "Stop"),
    ("download-to", "Download to:"),
    ("browse-button", "Browse..."),
    ("open-folder-button", "Open folder"),
    ("log-label", "Output"),
    ("clear-log", "Clear"),
    ("status-ready", "Ready"),
    ("status-stopping", "Stopping..."),
    ("auth-heading", "Authentication"),
    ("username-label", "Username:"),
    ("password-label", "Password:"),
    ("cookies-label", "Cookies file:"),
    ("config-label", "Config file:"),
    ("options-heading", "Download options"),
    ("opt-extract-links", "Only print download URLs (-g)"),
    ("opt-no-download", "Do not download files (--no-download)"),
    ("opt-write-info", "Write gallery info JSON (--write-info-json)"),
    ("opt-write-metadata", "Write metadata files (--write-metadata)"),
    ("save-settings", "Save settings"),
    ("reset-settings", "Reset to defaults"),
    ("reset-confirm", "Reset all settings to their defaults?"),
    ("settings-saved", "Settings saved"),
    ("settings-reset", "Settings reset to defaults"),
    ("search-label", "Search:"),
    ("category-label", "Category:"),
    ("open-site", "Open in browser"),
    ("select-site", "Select a website from the list to see its details."),
    ("error-title", "Error"),
    ("ok-button", "OK"),
    ("yes-button", "Yes"),
    ("no-button", "No"),
];

const ES_ES: &[(&str, &str)] = &[
    ("app-title", "Gallery-DL GUI"),
    ("tab-download", "Descargar"),
    ("tab-advanced", "Avanzado"),
    ("tab-sites", "Sitios compatibles"),
    ("url-label", "URL de la galería:"),
    ("url-placeholder", "Pegue la URL de una galería, perfil o publicación"),
    ("history-label", "Recientes"),
    ("test-button", "Probar URL"),
    ("download-button", "Descargar"),
    ("stop-button", "Detener"),
    ("download-to", "Descargar en:"),
    ("browse-button", "Examinar..."),
    ("open-folder-button", "Abrir carpeta"),
    ("log-label", "Salida"),
    ("clear-log", "Limpiar"),
    ("status-ready", "Listo"),
    ("status-stopping", "Deteniendo..."),
    ("auth-heading", "Autenticación"),
    ("username-label", "Usuario:"),
    ("password-label", "Contraseña:"),
    ("cookies-label", "Archivo de cookies:"),
    ("config-label", "Archivo de configuración:"),
    ("options-heading", "Opciones de descarga"),
    ("save-settings", "Guardar ajustes"),
    ("reset-settings", "Restablecer"),
    ("reset-confirm", "¿Restablecer todos los ajustes a sus valores predeterminados?"),
    ("settings-saved", "Ajustes guardados"),
    ("settings-reset", "Ajustes restablecidos"),
    ("search-label", "Buscar:"),
    ("category-label", "Categoría:"),
    ("open-site", "Abrir en el navegador"),
    ("select-site", "Seleccione un sitio de la lista para ver sus detalles."),
    ("error-title", "Error"),
    ("ok-button", "Aceptar"),
    ("yes-button", "Sí"),
    ("no-button", "No"),
];

pub struct Localizations {
    translations: HashMap<&'static str, Translations>,
    current_lang: String,
}

impl Default for Localizations {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizations {
    /// Picks the language from `LANG`, defaulting to English.
    pub fn new() -> Self {
        let lang = std::env::var("LANG").unwrap_or_default();
        Self::for_language(&lang)
    }

    pub fn for_language(lang: &str) -> Self {
        let mut translations = HashMap::new();
        translations.insert("en-US", Translations::from_pairs(EN_US));
        translations.insert("es-ES", Translations::from_pairs(ES_ES));

        let mut localizer = Self {
            translations,
            current_lang: FALLBACK_LANG.to_string(),
        };
        localizer.select(lang);
        localizer
    }

    pub fn current_language(&self) -> &str {
        &self.current_lang
    }

    /// Translated text for `key`; English when the current language lacks it,
    /// the key itself when nothing has it.
    pub fn text<'a>(&self, key: &'a str) -> &'a str {
        self.lookup_in(&self.current_lang, key)
            .or_else(|| self.lookup_in(FALLBACK_LANG, key))
            .unwrap_or(key)
    }

    fn lookup_in(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.translations.get(lang).and_then(|t| t.lookup(key))
    }

    /// Accepts `es-ES`, `es_ES.UTF-8`, `es` and the like; unknown languages
    /// select English.
    pub fn select(&mut self, lang: &str) {
        let normalized = lang.split('.').next().unwrap_or(lang).replace('_', "-");
        if self.translations.contains_key(normalized.as_str()) {
            self.current_lang = normalized;
            return;
        }

        let lang_part = normalized.split('-').next().unwrap_or_default().to_lowercase();
        if !lang_part.is_empty() {
            if let Some(key) = self
                .translations
                .keys()
                .find(|key| key.starts_with(lang_part.as_str()))
            {
                self.current_lang = key.to_string();
                return;
            }
        }

        self.current_lang = FALLBACK_LANG.to_string();
    }
}
