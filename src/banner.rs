// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    // Using a raw string literal for the multi-line banner
    let banner = r#"
                  _           _       _
 _   _ _____ ___ | |_  _____ | |_ ___| |__
| | | | ___ / _ \|  _ \(____ |  _) ___)  _ \
 \ V /| ____| |_| | |_) / ___ | |( (___| | | |
  \_/ |_____)___/|____/\_____|\__)____)_| |_|

    Batch Video Generation for Veo3
"#;
    println!("{}", banner);
}
