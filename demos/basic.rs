use chroma_signature::ColorMode;

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "painting.jpg".to_string());
    let img = chroma_signature::image::open(path).unwrap();
    let buf = img.to_rgb8();

    let signature = chroma_signature::Signature::from_image(buf).generate().unwrap();

    println!("{:#?}", signature.tone());
    println!("{:?}", signature.colors(ColorMode::Hex));
}
