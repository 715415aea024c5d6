use first_match::kernels::first_match::first_match_ptx;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", first_match_ptx());
    Ok(())
}
