fn main() -> std::process::ExitCode {
    ocr_reader_lib::run()
}
