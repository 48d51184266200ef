pub mod address_codec;
