mod input_tests;
mod render_tests;
mod settings_tests;
