//! User-facing text
//!
//! The verification portal is Spanish-language; every string a citizen can
//! see lives here so the session, viewer and CLI agree on wording.

use chrono::{DateTime, Local};

pub const INVALID_CODE: &str = "No se proporcionó un código válido";

pub const CONNECTION: &str =
    "No se pudo conectar con el servidor. Verifique su conexión a internet.";
pub const CONNECTION_HINT: &str =
    "Compruebe que su dispositivo esté conectado a internet y vuelva a intentarlo.";

pub const SECURITY: &str = "Error de seguridad en la conexión con el servidor.";
pub const SECURITY_HINT: &str =
    "Es posible que haya un problema con el certificado de seguridad del servidor.";

pub const TIMEOUT: &str = "La conexión con el servidor ha tardado demasiado tiempo.";
pub const TIMEOUT_HINT: &str =
    "El servidor podría estar experimentando problemas. Intente más tarde.";

pub const CORS: &str = "Error de acceso al servidor.";
pub const CORS_HINT: &str =
    "Hay un problema de configuración en el servidor. Contacte al administrador.";

pub const GENERIC: &str = "Error inesperado al procesar el certificado";

pub const NOT_FOUND: &str = "El certificado solicitado no existe.";
pub const FORBIDDEN: &str = "No tiene permisos para acceder a este certificado.";
pub const SERVER_ERROR: &str = "Error en el servidor. Por favor, intente más tarde.";

pub const NOT_A_DOCUMENT: &str = "La respuesta del servidor no es un PDF válido.";
pub const EMPTY_DOCUMENT: &str = "El servidor devolvió un documento vacío.";
pub const CORRUPT_DOCUMENT: &str = "El documento recibido no es un PDF válido o está dañado.";
pub const NO_PAGES: &str = "El PDF no contiene páginas.";

pub const COPY_BLOCKED: &str = "No está permitido copiar, descargar o imprimir este documento.";
pub const PRINT_BLOCKED: &str = "No está permitido imprimir este documento.";
pub const PROTECTED_NOTICE: &str = "Este documento está protegido por medidas de seguridad.";

pub const VERIFIED_TITLE: &str = "Certificado verificado correctamente";
pub const VERIFIED_SUBTITLE: &str =
    "Este documento ha sido validado por el Gobierno Autónomo Municipal de Cochabamba";
pub const INVALID_TITLE: &str = "Certificado no válido";

/// Link offered next to connectivity failures.
pub const CONNECTION_HELP_URL: &str =
    "https://www.google.com/search?q=problemas+de+conexión+a+internet";

/// Generic status message when the server sent no body text.
pub fn status_error(status: u16) -> String {
    format!("Error {}: No se pudo obtener el certificado", status)
}

/// Loading caption for a progress value.
pub fn progress_label(progress: u8) -> &'static str {
    match progress {
        0..=19 => "Preparando solicitud...",
        20..=49 => "Conectando con el servidor de certificaciones...",
        50..=69 => "Descargando certificado...",
        70..=89 => "Procesando documento...",
        _ => "Finalizando...",
    }
}

/// Caption under each rendered page.
pub fn page_caption(page_number: usize, total: usize) -> String {
    format!("Página {} de {}", page_number, total)
}

/// Footer lines under a verified certificate: verification date and code.
pub fn verification_footer(verified_at: &DateTime<Local>, code: &str) -> [String; 2] {
    [
        format!("Fecha de verificación: {}", verified_at.format("%d/%m/%Y")),
        format!("Código de verificación: {}", code),
    ]
}
