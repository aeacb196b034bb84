fn main() -> std::process::ExitCode {
    notesift_lib::run()
}
