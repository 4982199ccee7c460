//! Command-line construction for yt-dlp.

use std::ffi::{OsStr, OsString};

use vidgrab_core::ports::{CookieSource, FetchOptions};

use super::protocol::PROGRESS_MARKER;

fn push_flag(args: &mut Vec<OsString>, flag: &str, value: impl AsRef<OsStr>) {
    args.push(flag.into());
    args.push(value.as_ref().to_os_string());
}

/// Arguments shared by every invocation.
fn common_args(options: &FetchOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--no-warnings".into(), "--no-colors".into()];

    match &options.cookies {
        Some(CookieSource::Browser(browser)) => {
            push_flag(&mut args, "--cookies-from-browser", browser);
        }
        Some(CookieSource::File(path)) => {
            push_flag(&mut args, "--cookies", path);
        }
        None => {}
    }

    if let Some(dir) = &options.cache_dir {
        push_flag(&mut args, "--cache-dir", dir);
    }
    if let Some(secs) = options.socket_timeout_secs {
        push_flag(&mut args, "--socket-timeout", secs.to_string());
    }
    args
}

/// Arguments for a metadata-only run.
pub fn metadata_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args = common_args(options);
    args.extend(["--dump-single-json", "--skip-download", "--no-playlist"].map(OsString::from));
    push_flag(&mut args, "-f", &options.format_selector);
    args.push("--".into());
    args.push(url.into());
    args
}

/// Arguments for a download run.
pub fn fetch_args(url: &str, options: &FetchOptions) -> Vec<OsString> {
    let mut args = common_args(options);

    args.extend(["--newline", "--no-playlist"].map(OsString::from));
    push_flag(
        &mut args,
        "--progress-template",
        format!("download:{PROGRESS_MARKER}%(progress)j"),
    );
    push_flag(&mut args, "-f", &options.format_selector);
    push_flag(&mut args, "-o", &options.output_template);
    push_flag(
        &mut args,
        "--concurrent-fragments",
        options.concurrent_fragments.max(1).to_string(),
    );
    push_flag(&mut args, "--retries", options.retries.retries.to_string());
    push_flag(
        &mut args,
        "--fragment-retries",
        options.retries.fragment_retries.to_string(),
    );

    if let Some(container) = options.merge_container {
        push_flag(&mut args, "--merge-output-format", container.as_str());
    }
    if let Some(rate) = options.rate_limit_bytes_per_sec {
        push_flag(&mut args, "--limit-rate", rate.to_string());
    }
    if let Some(chunk) = options.http_chunk_size_bytes {
        push_flag(&mut args, "--http-chunk-size", chunk.to_string());
    }
    if let Some(buffer) = options.buffer_size_bytes {
        push_flag(&mut args, "--buffer-size", buffer.to_string());
    }
    if let Some(dir) = &options.temp_dir {
        let mut temp_path = OsString::from("temp:");
        temp_path.push(dir);
        push_flag(&mut args, "--paths", temp_path);
    }
    if let Some(ffmpeg) = &options.ffmpeg_location {
        push_flag(&mut args, "--ffmpeg-location", ffmpeg);
    }
    if options.keep_original {
        args.push("--keep-video".into());
    }

    args.push("--".into());
    args.push(url.into());
    args
}
