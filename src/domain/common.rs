/// Short label used when a record is listed on the command line.
pub trait Displayable {
    fn display_label(&self) -> String;
}
