use bookbag::settings::API_KEY;
use bookbag::settings::URL;
use bookbag::store::{EntityStore, RemoteStore};
use bookbag::Course;


#[tokio::main]
async fn main() {
    // This is just a function to silence "unused function" warning

    let store = RemoteStore::new(URL, API_KEY).unwrap();
    let courses: Vec<Course> = store.list().await.unwrap();
    let _ = courses.iter()
        .map(|course| println!("  {}\t{}", course.code(), course.name()))
        .collect::<()>();
}
