//! C-ABI wrapper around `books-core`.
//!
//! # Overview
//! Exposes the search pipeline through `extern "C"` functions for a mobile
//! host that performs its own networking: the host asks for a request,
//! executes it, and hands the response back for parsing. Cover bytes are
//! decoded the same way.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `books_build_*` / `books_parse_search` mirror the core client 1:1.
//! - `FfiBooksResult` conveys the book list or an error code with message.
//! - The C caller owns all returned pointers and must call the matching
//!   `books_free_*` function to release them. Strings returned by
//!   `books_empty_state_message` are static and must not be freed.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use books_core::{decode_cover, BooksClient, HttpResponse, NO_BOOKS_MESSAGE, NO_INTERNET_MESSAGE};

use types::*;

/// Borrow a C string as UTF-8. Invalid UTF-8 reads as an empty string.
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string.
unsafe fn str_arg<'a>(ptr: *const c_char) -> &'a str {
    CStr::from_ptr(ptr).to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `BooksClient` bound to `base_url`.
///
/// `max_results` of 0 selects the default (15); larger values are clamped
/// to what the API accepts. Returns null if `base_url` is null or if an
/// internal panic occurs. The caller must free the returned pointer with
/// `books_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_new(base_url: *const c_char, max_results: u32) -> *mut FfiBooksClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { str_arg(base_url) };
        let mut client = BooksClient::new(url);
        if max_results > 0 {
            client = client.with_max_results(max_results);
        }
        Box::into_raw(Box::new(FfiBooksClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `BooksClient` created by `books_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_client_free(client: *mut FfiBooksClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the search request for `query`.
///
/// Returns null if an argument is null, the query is blank, or the
/// resulting URL is invalid.
/// The caller must free the returned pointer with `books_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn books_build_search(
    client: *const FfiBooksClient,
    query: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || query.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let query = unsafe { str_arg(query) };
        match client.inner.build_search(query) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request that downloads a book's cover from `thumbnail_url`.
///
/// Returns null if an argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn books_build_cover(
    client: *const FfiBooksClient,
    thumbnail_url: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || thumbnail_url.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let url = unsafe { str_arg(thumbnail_url) };
        FfiHttpRequest::from_core(client.inner.build_cover_request(url))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse / decode functions
// ---------------------------------------------------------------------------

fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        Vec::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }.to_bytes().to_vec()
    };
    HttpResponse::new(resp.status, body)
}

/// Parse the response to a search request.
///
/// A 200 response yields `error_code = Ok` and a (possibly empty) book list;
/// a malformed entry truncates the list at that entry.
#[unsafe(no_mangle)]
pub extern "C" fn books_parse_search(
    client: *const FfiBooksClient,
    response: *const FfiHttpResponse,
) -> *mut FfiBooksResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiBooksResult::null_arg("client");
        }
        if response.is_null() {
            return FfiBooksResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        match client.inner.parse_search(ffi_response_to_core(resp)) {
            Ok(books) => FfiBooksResult::ok_books(books),
            Err(e) => FfiBooksResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiBooksResult::panic("panic in books_parse_search"))
}

/// Decode `len` bytes of PNG, JPEG or GIF data into RGBA8 pixels.
///
/// Returns null if `data` is null or the bytes are not a decodable image.
/// The caller must free the returned pointer with `books_free_cover`.
#[unsafe(no_mangle)]
pub extern "C" fn books_decode_cover(data: *const u8, len: usize) -> *mut FfiCoverImage {
    catch_unwind(|| {
        if data.is_null() {
            return std::ptr::null_mut();
        }
        let bytes = unsafe { std::slice::from_raw_parts(data, len) };
        match decode_cover(bytes) {
            Ok(cover) => FfiCoverImage::from_core(cover),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Text for the empty-state view: the "no internet" message when `offline`,
/// the "no books" message otherwise. The string is static.
#[unsafe(no_mangle)]
pub extern "C" fn books_empty_state_message(offline: bool) -> *const c_char {
    static NO_BOOKS: &CStr = c"No books found.";
    static NO_INTERNET: &CStr = c"No internet connection.";
    debug_assert_eq!(NO_BOOKS.to_str(), Ok(NO_BOOKS_MESSAGE));
    debug_assert_eq!(NO_INTERNET.to_str(), Ok(NO_INTERNET_MESSAGE));
    if offline {
        NO_INTERNET.as_ptr()
    } else {
        NO_BOOKS.as_ptr()
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `books_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        for h in unsafe { from_raw_array(req.headers, req.headers_len) } {
            if !h.key.is_null() {
                drop(unsafe { CString::from_raw(h.key) });
            }
            if !h.value.is_null() {
                drop(unsafe { CString::from_raw(h.value) });
            }
        }
    });
}

/// Free an `FfiBooksResult` returned by `books_parse_search`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_result(result: *mut FfiBooksResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.books.is_null() {
            let list = unsafe { Box::from_raw(result.books) };
            for book in unsafe { from_raw_array(list.items, list.len) } {
                free_ffi_book_fields(&book);
            }
        }
    });
}

/// Free an `FfiCoverImage` returned by `books_decode_cover`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_cover(cover: *mut FfiCoverImage) {
    if cover.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let cover = unsafe { Box::from_raw(cover) };
        if !cover.pixels.is_null() {
            let pixels = std::ptr::slice_from_raw_parts_mut(cover.pixels, cover.pixels_len);
            drop(unsafe { Box::from_raw(pixels) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn books_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
