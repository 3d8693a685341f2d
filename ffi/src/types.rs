//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of `Vec`.
//! Arrays are handed out as boxed slices so they can be rebuilt with their
//! exact length when freed. Conversion functions live here to keep `lib.rs`
//! focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use books_core::{ApiError, Book, CoverImage};

/// Opaque handle to a `BooksClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiBooksClient {
    pub(crate) inner: books_core::BooksClient,
}

/// Copy `s` into a newly allocated C string. Interior NULs are dropped.
pub(crate) fn to_c_string(s: &str) -> *mut c_char {
    let bytes: Vec<u8> = s.bytes().filter(|b| *b != 0).collect();
    CString::new(bytes).unwrap_or_default().into_raw()
}

/// Leak `items` as a raw array, returning null for an empty vector.
pub(crate) fn into_raw_array<T>(items: Vec<T>) -> (*mut T, u32) {
    let len = items.len() as u32;
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim an array leaked by `into_raw_array`.
///
/// # Safety
/// `ptr` and `len` must come from a single `into_raw_array` call.
pub(crate) unsafe fn from_raw_array<T>(ptr: *mut T, len: u32) -> Vec<T> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    Box::from_raw(slice).into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A `GET` request described as C-compatible plain data.
///
/// Built by `books_build_*` functions. The C caller executes the request
/// and passes the response back through `books_parse_search` or
/// `books_decode_cover`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: books_core::HttpRequest) -> *mut Self {
        let headers = req
            .headers
            .iter()
            .map(|(k, v)| FfiHeader {
                key: to_c_string(k),
                value: to_c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_array(headers);
        Box::into_raw(Box::new(FfiHttpRequest {
            url: to_c_string(&req.url),
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a search
/// request, then passes a pointer to `books_parse_search`. The FFI layer
/// reads but does not free these fields. A null `body` is an empty body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiBooksResult`.
#[repr(C)]
#[derive(Debug)]
pub enum FfiErrorCode {
    Ok = 0,
    EmptyQuery = 1,
    InvalidUrl = 2,
    Transport = 3,
    Http = 4,
    Deserialization = 5,
    Image = 6,
    Config = 7,
    Cancelled = 8,
    Worker = 9,
    Panic = 10,
    NullArg = 11,
}

/// A single book exposed to C. The cover is fetched and decoded separately.
#[repr(C)]
pub struct FfiBook {
    pub title: *mut c_char,
    pub authors: *mut c_char,
    pub description: *mut c_char,
    pub rating: f64,
    pub thumbnail_url: *mut c_char,
    pub info_url: *mut c_char,
}

impl FfiBook {
    fn from_core(book: &Book) -> Self {
        FfiBook {
            title: to_c_string(&book.title),
            authors: to_c_string(&book.authors),
            description: to_c_string(&book.description),
            rating: book.rating,
            thumbnail_url: to_c_string(&book.thumbnail_url),
            info_url: to_c_string(&book.info_url),
        }
    }
}

/// A list of books exposed to C, in response order.
#[repr(C)]
pub struct FfiBookList {
    pub items: *mut FfiBook,
    pub len: u32,
}

/// Result envelope for `books_parse_search`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `books`
/// points to a (possibly empty) list. On failure `error_code` describes the
/// category, `error_message` is a human-readable C string, and `books` is
/// null.
#[repr(C)]
pub struct FfiBooksResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub books: *mut FfiBookList,
}

impl FfiBooksResult {
    pub(crate) fn ok_books(books: Vec<Book>) -> *mut Self {
        let items = books.iter().map(FfiBook::from_core).collect();
        let (items, len) = into_raw_array(items);
        let list = Box::new(FfiBookList { items, len });
        Box::into_raw(Box::new(FfiBooksResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 200,
            books: Box::into_raw(list),
        }))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::EmptyQuery => (FfiErrorCode::EmptyQuery, 0),
            ApiError::InvalidUrl(_) => (FfiErrorCode::InvalidUrl, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::HttpError { status, .. } => (FfiErrorCode::Http, *status),
            ApiError::DeserializationError(_) => (FfiErrorCode::Deserialization, 0),
            ApiError::Image(_) => (FfiErrorCode::Image, 0),
            ApiError::Config(_) => (FfiErrorCode::Config, 0),
            ApiError::Cancelled => (FfiErrorCode::Cancelled, 0),
            ApiError::Worker(_) => (FfiErrorCode::Worker, 0),
        };
        Self::failure(error_code, http_status, &err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, msg)
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiBooksResult {
            error_code,
            error_message: to_c_string(msg),
            http_status,
            books: std::ptr::null_mut(),
        }))
    }
}

/// Free the C-string fields of an `FfiBook` (but not the struct itself).
pub(crate) fn free_ffi_book_fields(book: &FfiBook) {
    for field in [
        book.title,
        book.authors,
        book.description,
        book.thumbnail_url,
        book.info_url,
    ] {
        if !field.is_null() {
            drop(unsafe { CString::from_raw(field) });
        }
    }
}

// ---------------------------------------------------------------------------
// Cover images
// ---------------------------------------------------------------------------

/// A decoded cover: `pixels_len` bytes of tightly packed RGBA8, row-major.
#[repr(C)]
pub struct FfiCoverImage {
    pub width: u32,
    pub height: u32,
    pub pixels: *mut u8,
    pub pixels_len: usize,
}

impl FfiCoverImage {
    pub(crate) fn from_core(cover: CoverImage) -> *mut Self {
        let pixels_len = cover.pixels.len();
        let pixels = Box::into_raw(cover.pixels.into_boxed_slice()) as *mut u8;
        Box::into_raw(Box::new(FfiCoverImage {
            width: cover.width,
            height: cover.height,
            pixels,
            pixels_len,
        }))
    }
}
