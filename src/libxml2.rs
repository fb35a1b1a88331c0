//! LibXML2 FFI bindings for XML Schema validation of written sitemap files.
//!
//! Only the handful of entry points needed to compile an in-memory XSD and
//! validate a file on disk against it are bound here. Compiled schemas are
//! reference counted and freed on drop.
//!
//! ## Thread Safety
//!
//! libxml2 schema *parsing* is not thread-safe, while *validation* against an
//! already compiled schema is, as long as every validation gets its own
//! context (see <http://xmlsoft.org/threads.html>). [`CompiledSchema`] is
//! therefore `Send + Sync`, and [`LibXml2::compile_schema`] serializes itself
//! behind a process-wide lock.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use libc::{c_char, c_int, c_uint};

use crate::error::{LibXml2Error, LibXml2Result};

/// libxml2's global initialization functions are not thread-safe
static LIBXML2_INIT: Once = Once::new();

/// Schema parsing is not thread-safe either
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateFile(
        ctxt: *const XmlSchemaValidCtxt,
        file_name: *const c_char,
        options: c_uint,
    ) -> c_int;
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut libc::c_void,
    );
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut libc::c_void,
    pub node: *mut libc::c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut libc::c_void, error: *mut xmlError)>;

/// Collects each reported message, prefixed with its line number when known
unsafe extern "C" fn collect_error(user_data: *mut libc::c_void, error: *mut xmlError) {
    let messages = unsafe { &mut *(user_data as *mut Vec<String>) };
    if error.is_null() {
        return;
    }

    let (msg_ptr, line) = unsafe { ((*error).message, (*error).line) };
    if msg_ptr.is_null() {
        return;
    }
    if let Ok(text) = unsafe { CStr::from_ptr(msg_ptr) }.to_str() {
        let text = text.trim();
        if line > 0 {
            messages.push(format!("line {}: {}", line, text));
        } else {
            messages.push(text.to_string());
        }
    }
}

/// A compiled XSD, shareable across threads
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    inner: Arc<SchemaHandle>,
}

#[derive(Debug)]
struct SchemaHandle {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: compiled xmlSchema structures are read-only during validation.
unsafe impl Send for SchemaHandle {}
unsafe impl Sync for SchemaHandle {}

impl CompiledSchema {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and must not be freed elsewhere.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed);
        }
        Ok(Self {
            inner: Arc::new(SchemaHandle {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Drop for SchemaHandle {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { xmlSchemaFree(self.ptr) };
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Outcome of validating one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XsdOutcome {
    Valid,
    Invalid { error_count: i32, errors: Vec<String> },
    InternalError { code: i32 },
}

impl XsdOutcome {
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => XsdOutcome::Valid,
            n if n > 0 => XsdOutcome::Invalid {
                error_count: n,
                errors,
            },
            n => XsdOutcome::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, XsdOutcome::Valid)
    }
}

/// Handle to an initialized libxml2
#[derive(Debug)]
pub struct LibXml2 {
    _phantom: PhantomData<()>,
}

impl LibXml2 {
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });
        Self {
            _phantom: PhantomData,
        }
    }

    /// Compile an XSD held in memory
    pub fn compile_schema(&self, xsd: &[u8]) -> LibXml2Result<CompiledSchema> {
        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(xsd.as_ptr() as *const c_char, xsd.len() as c_int);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            CompiledSchema::from_raw(schema_ptr)
        }
    }

    /// Validate the file at `file_path` as it currently exists on disk.
    ///
    /// Negative libxml2 return codes surface as `LibXml2Error::ValidationFailed`.
    pub fn validate_file(
        &self,
        schema: &CompiledSchema,
        file_path: &Path,
    ) -> LibXml2Result<XsdOutcome> {
        let failed = |code| LibXml2Error::ValidationFailed {
            code,
            file: file_path.to_path_buf(),
        };
        let path_str = file_path.to_str().ok_or_else(|| failed(-1))?;
        let c_path = CString::new(path_str).map_err(|_| failed(-1))?;

        let outcome = unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut errors: Vec<String> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(collect_error),
                &mut errors as *mut Vec<String> as *mut libc::c_void,
            );

            let code = xmlSchemaValidateFile(valid_ctxt, c_path.as_ptr(), 0);
            xmlSchemaFreeValidCtxt(valid_ctxt);

            XsdOutcome::from_code(code, errors)
        };

        match outcome {
            XsdOutcome::InternalError { code } => Err(failed(code)),
            other => Ok(other),
        }
    }
}

impl Default for LibXml2 {
    fn default() -> Self {
        Self::new()
    }
}
