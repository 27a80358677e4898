pub mod adrv904x;
