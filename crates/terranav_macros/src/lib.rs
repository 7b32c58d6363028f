use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn};

/// Time a function when the `perf_stats` feature is enabled.
///
/// The function body is preceded by a drop guard that measures wall time and
/// logs it through Bevy's `info!` when the call exceeds the threshold. Without
/// `perf_stats` the guard is compiled out entirely.
///
/// Per-tick callbacks use `profile_log!` instead; this attribute is for
/// one-off builds.
///
/// ```ignore
/// #[profile(5)] // threshold in milliseconds, defaults to 1
/// fn build_gates(&mut self) { ... }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        attr.to_string().trim().parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let guard = quote! {
        struct ProfileGuard {
            name: &'static str,
            start: std::time::Instant,
        }
        impl Drop for ProfileGuard {
            fn drop(&mut self) {
                let elapsed = self.start.elapsed();
                if elapsed.as_millis() > #threshold_ms {
                    bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                }
            }
        }
        ProfileGuard {
            name: concat!(module_path!(), "::", #fn_name_str),
            start: std::time::Instant::now(),
        }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                #guard
            };

            #block
        }
    };

    output.into()
}
